use crate::{
    config::GatewayConfig,
    errors::{AnalyzerError, Result},
};
use ethers::{
    abi::{Abi, Function, ParamType, Token},
    providers::{Http, Middleware, Provider, ProviderError},
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256},
    utils::to_checksum,
};
use std::{str::FromStr, sync::Arc};

/// Arguments for a read-only call. Reads are attempted with no argument first and then with a
/// single holder address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallArgs {
    None,
    Holder(Address),
}

impl CallArgs {
    fn tokens(&self) -> Vec<Token> {
        match self {
            CallArgs::None => vec![],
            CallArgs::Holder(address) => vec![Token::Address(*address)],
        }
    }

    fn accepts(&self, function: &Function) -> bool {
        match self {
            CallArgs::None => function.inputs.is_empty(),
            CallArgs::Holder(_) => {
                function.inputs.len() == 1 && function.inputs[0].kind == ParamType::Address
            }
        }
    }
}

pub fn provider_from_config(config: &GatewayConfig) -> Result<Arc<Provider<Http>>> {
    let provider = Provider::<Http>::try_from(config.rpc_url.as_str()).map_err(|e| {
        AnalyzerError::Provider(ProviderError::CustomError(format!("Invalid RPC URL: {e}")))
    })?;
    Ok(Arc::new(provider))
}

/// Parses a hex address. All-lowercase and all-uppercase input is accepted as is, mixed-case input
/// must carry a valid EIP-55 checksum.
pub fn parse_address(input: &str) -> Result<Address> {
    let trimmed = input.trim();
    let address =
        Address::from_str(trimmed).map_err(|_| AnalyzerError::InvalidAddress(input.to_string()))?;

    let digits = trimmed.trim_start_matches("0x");
    let mixed_case = digits.chars().any(|c| c.is_ascii_lowercase()) &&
        digits.chars().any(|c| c.is_ascii_uppercase());
    if mixed_case && to_checksum(&address, None).trim_start_matches("0x") != digits {
        return Err(AnalyzerError::InvalidAddress(format!("{input} (bad checksum)")))
    }
    Ok(address)
}

pub async fn contract_runtime_code(
    provider: &Arc<Provider<Http>>,
    address: Address,
) -> Result<Bytes> {
    Ok(provider.get_code(address, None).await?)
}

pub async fn latest_block(provider: &Arc<Provider<Http>>) -> Result<u64> {
    Ok(provider.get_block_number().await?.as_u64())
}

/// Finds the overload of `name` whose inputs fit `args`.
pub fn find_overload<'a>(abi: &'a Abi, name: &str, args: &CallArgs) -> Option<&'a Function> {
    abi.functions_by_name(name).ok()?.iter().find(|function| args.accepts(function))
}

/// Calls a view function and decodes its first output as an unsigned integer.
///
/// Returns `Ok(None)` when the ABI has no overload of `function` accepting `args`, or when the
/// first output is not an integer.
pub async fn read_uint(
    provider: &Arc<Provider<Http>>,
    contract: Address,
    abi: &Abi,
    function: &str,
    args: CallArgs,
) -> Result<Option<U256>> {
    let Some(function) = find_overload(abi, function, &args) else { return Ok(None) };

    let data = function.encode_input(&args.tokens())?;
    let tx: TypedTransaction = TransactionRequest::new().to(contract).data(data).into();
    let output = provider.call(&tx, None).await?;

    let tokens = function.decode_output(output.as_ref())?;
    Ok(tokens.into_iter().next().and_then(Token::into_uint))
}
