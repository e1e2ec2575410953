#![allow(dead_code)]

use async_trait::async_trait;
use ethers::{
    abi::Abi,
    types::{Address, U256},
};
use once_cell::sync::Lazy;
use serde_json::json;
use std::{collections::HashMap, net::TcpListener, sync::Arc, time::Duration};
use vesting_analyzer::{
    analysis::Analyzer,
    errors::{AnalyzerError, Result},
    explorer::CreationInfo,
    gateway::ContractGateway,
    provider::{find_overload, parse_address, CallArgs},
    telemetry::{get_subscriber, init_subscriber},
};

/// A verified vesting wallet with every known keyword.
pub const VESTING_WALLET: &str = "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984";
/// A deployed contract whose ABI is not published.
pub const UNVERIFIED: &str = "0x0000000000000000000000000000000000000002";

// Ensure that the `tracing` stack is only initialized once.
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    // We only print logs to the console if the `TEST_LOG` environment variable is set.
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

fn view(name: &str, inputs: &[&str]) -> serde_json::Value {
    let inputs: Vec<_> = inputs.iter().map(|kind| json!({ "name": "", "type": kind })).collect();
    json!({
        "type": "function",
        "name": name,
        "inputs": inputs,
        "outputs": [{ "name": "", "type": "uint256" }],
        "stateMutability": "view"
    })
}

/// Gateway serving a fixed set of contracts from memory.
pub struct StubGateway {
    abis: HashMap<Address, Option<Abi>>,
}

impl StubGateway {
    pub fn new() -> Self {
        let abi: Abi = serde_json::from_value(json!([
            view("vestedAmount", &["address"]),
            view("released", &[]),
            view("releasable", &[]),
            view("release", &[]),
            view("cliff", &[]),
            view("duration", &[]),
            view("start", &[]),
            view("beneficiary", &[]),
            view("owner", &[]),
            view("token", &[]),
        ]))
        .expect("Invalid test ABI");

        let mut abis = HashMap::new();
        abis.insert(parse_address(VESTING_WALLET).unwrap(), Some(abi));
        abis.insert(parse_address(UNVERIFIED).unwrap(), None);
        Self { abis }
    }
}

#[async_trait]
impl ContractGateway for StubGateway {
    async fn has_code(&self, address: Address) -> Result<bool> {
        Ok(self.abis.contains_key(&address))
    }

    async fn fetch_abi(&self, address: Address) -> Result<Option<Abi>> {
        Ok(self.abis.get(&address).cloned().flatten())
    }

    async fn is_verified(&self, address: Address) -> Result<bool> {
        Ok(matches!(self.abis.get(&address), Some(Some(_))))
    }

    async fn creation_info(&self, _address: Address) -> Result<Option<CreationInfo>> {
        Err(AnalyzerError::Explorer("rate limited".into()))
    }

    async fn read_uint(
        &self,
        _contract: Address,
        abi: &Abi,
        function: &str,
        args: CallArgs,
    ) -> Result<Option<U256>> {
        if find_overload(abi, function, &args).is_none() {
            return Ok(None)
        }
        match (function, args) {
            ("vestedAmount", CallArgs::Holder(_)) => Ok(Some(U256::exp10(18) * 100)),
            ("released", CallArgs::None) => Ok(Some(U256::exp10(18) * 40)),
            _ => Err(AnalyzerError::Explorer("execution reverted".into())),
        }
    }
}

pub struct TestApp {
    pub address: String,
}

// Launch our application in the background.
// We are running tests, so it is not worth it to propagate errors: if we fail to perform the
// required setup we can just panic and crash all the things.
pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");

    // We retrieve the port assigned to us by the OS.
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{port}");

    let analyzer = Analyzer::new(Arc::new(StubGateway::new())).with_rate_limit(Duration::ZERO);

    // Launch the server as a background task.
    // `tokio::`spawn returns a handle to the spawned future, but we have no use for it here, hence
    // the non-binding `let`.
    let server = vesting_analyzer::startup::run(listener, analyzer).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp { address }
}
