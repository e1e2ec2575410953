use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("{0} is not a supported network. Must be `mainnet`, `goerli` or `polygon`")]
    UnsupportedNetwork(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Address {0} does not appear to be a contract")]
    NotAContract(String),

    #[error("Unable to fetch the contract ABI for {0}")]
    AbiUnavailable(String),

    #[error("RPC error: {0}")]
    Provider(#[from] ethers::providers::ProviderError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ABI error: {0}")]
    Abi(#[from] ethers::abi::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Explorer API error: {0}")]
    Explorer(String),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
