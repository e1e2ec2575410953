use clap::Parser;
use std::sync::Arc;
use vesting_analyzer::{
    analysis::{Analyzer, ContractRef},
    config::{AnalysisSettings, GatewayConfig},
    gateway::EthereumGateway,
    network::Network,
    telemetry,
};

/// Analyze a single vesting contract
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Contract address
    #[arg(value_name = "ADDRESS")]
    address: String,

    /// Beneficiary address passed to the amount getters
    #[arg(short, long)]
    beneficiary: Option<String>,

    /// Network to use: mainnet, goerli or polygon
    #[arg(short, long, default_value = "mainnet")]
    network: String,

    /// Name shown in the report
    #[arg(long, default_value = "CustomToken")]
    name: String,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Show debug logs
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose { "vesting_analyzer=debug" } else { "warn" };
    let subscriber =
        telemetry::get_subscriber("check-contract".into(), filter.into(), std::io::stderr);
    telemetry::init_subscriber(subscriber);

    let settings =
        AnalysisSettings { network: Network::try_from(args.network)?, ..Default::default() };
    let gateway = EthereumGateway::new(&GatewayConfig::from_env(&settings)?)?;
    let analyzer = Analyzer::new(Arc::new(gateway));

    let mut contract = ContractRef::new(args.address).with_name(args.name);
    if let Some(beneficiary) = args.beneficiary {
        contract = contract.with_beneficiary(beneficiary);
    }

    let result = analyzer.analyze_contract(&contract).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{result}");
    }

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
