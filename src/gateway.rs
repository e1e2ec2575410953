use crate::{
    config::GatewayConfig,
    errors::Result,
    explorer::{CreationInfo, ExplorerClient},
    network::Network,
    provider::{self, CallArgs},
};
use async_trait::async_trait;
use ethers::{
    abi::Abi,
    providers::{Http, Provider},
    types::{Address, U256},
    utils::to_checksum,
};
use std::sync::Arc;

/// Everything the analyzer needs from the outside world: a chain node for code and read-only
/// calls, and a metadata API for ABIs, verification status and creation info.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// Whether the address holds deployed bytecode.
    async fn has_code(&self, address: Address) -> Result<bool>;

    /// The published ABI of the contract, if any.
    async fn fetch_abi(&self, address: Address) -> Result<Option<Abi>>;

    /// Whether the contract source is publicly verified.
    async fn is_verified(&self, address: Address) -> Result<bool>;

    /// Creator and creation transaction of the contract, if known.
    async fn creation_info(&self, address: Address) -> Result<Option<CreationInfo>>;

    /// Calls a view function returning an integer. `Ok(None)` means the contract has no overload
    /// accepting `args`.
    async fn read_uint(
        &self,
        contract: Address,
        abi: &Abi,
        function: &str,
        args: CallArgs,
    ) -> Result<Option<U256>>;
}

/// Gateway backed by an `ethers` HTTP provider and an Etherscan-style API.
pub struct EthereumGateway {
    network: Network,
    provider: Arc<Provider<Http>>,
    explorer: ExplorerClient,
}

impl EthereumGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Ok(Self {
            network: config.network,
            provider: provider::provider_from_config(config)?,
            explorer: ExplorerClient::new(config)?,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Latest block number, used to check connectivity.
    pub async fn latest_block(&self) -> Result<u64> {
        provider::latest_block(&self.provider).await
    }
}

#[async_trait]
impl ContractGateway for EthereumGateway {
    async fn has_code(&self, address: Address) -> Result<bool> {
        let code = provider::contract_runtime_code(&self.provider, address).await?;
        Ok(!code.is_empty())
    }

    async fn fetch_abi(&self, address: Address) -> Result<Option<Abi>> {
        self.explorer.get_abi(&to_checksum(&address, None)).await
    }

    async fn is_verified(&self, address: Address) -> Result<bool> {
        self.explorer.is_verified(&to_checksum(&address, None)).await
    }

    async fn creation_info(&self, address: Address) -> Result<Option<CreationInfo>> {
        self.explorer.contract_creation(&to_checksum(&address, None)).await
    }

    async fn read_uint(
        &self,
        contract: Address,
        abi: &Abi,
        function: &str,
        args: CallArgs,
    ) -> Result<Option<U256>> {
        provider::read_uint(&self.provider, contract, abi, function, args).await
    }
}
