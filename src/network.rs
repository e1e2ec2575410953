use crate::errors::AnalyzerError;
use ethers::types::Chain;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The networks the analyzer can connect to. Each one has its own RPC gateway endpoint and its
/// own Etherscan-style metadata API.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Network {
    /// Ethereum mainnet.
    #[default]
    Mainnet,
    /// The Goerli test network.
    Goerli,
    /// Polygon PoS mainnet.
    Polygon,
}

impl Network {
    /// Returns the network as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Goerli => "goerli",
            Network::Polygon => "polygon",
        }
    }

    pub fn chain(&self) -> Chain {
        match self {
            Network::Mainnet => Chain::Mainnet,
            Network::Goerli => Chain::Goerli,
            Network::Polygon => Chain::Polygon,
        }
    }

    /// Returns the Infura RPC endpoint for this network, authenticated with the given project id.
    pub fn rpc_url(&self, project_id: &str) -> String {
        let host = match self {
            Network::Mainnet => "mainnet.infura.io",
            Network::Goerli => "goerli.infura.io",
            Network::Polygon => "polygon-mainnet.infura.io",
        };
        format!("https://{host}/v3/{project_id}")
    }

    /// Returns the base URL of the contract metadata API for this network.
    pub fn explorer_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://api.etherscan.io/api",
            Network::Goerli => "https://api-goerli.etherscan.io/api",
            Network::Polygon => "https://api.polygonscan.com/api",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Network {
    type Error = AnalyzerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "goerli" => Ok(Self::Goerli),
            "polygon" => Ok(Self::Polygon),
            _ => Err(AnalyzerError::UnsupportedNetwork(s)),
        }
    }
}

impl From<Network> for String {
    fn from(network: Network) -> Self {
        network.as_str().to_string()
    }
}
