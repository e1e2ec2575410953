use crate::{
    config::GatewayConfig,
    errors::{AnalyzerError, Result},
};
use ethers::abi::Abi;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Envelope shared by every Etherscan-style endpoint. `result` is a string on failure and a
/// string or an array on success, so it is decoded lazily.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: serde_json::Value,
}

impl ExplorerResponse {
    fn is_ok(&self) -> bool {
        self.status == "1"
    }
}

/// A single record of the `getsourcecode` endpoint. Only the field needed to tell whether the
/// source was published is decoded.
#[derive(Debug, Deserialize)]
struct SourceCodeResult {
    #[serde(rename = "SourceCode", default)]
    source_code: String,
}

/// Creation metadata of a contract, as reported by the `getcontractcreation` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationInfo {
    pub contract_address: String,
    pub contract_creator: String,
    pub tx_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Client for an Etherscan-style contract metadata API.
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ExplorerClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, base_url: config.explorer_url.clone(), api_key: config.api_key.clone() })
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<ExplorerResponse> {
        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<ExplorerResponse>().await?)
    }

    /// Fetches the published ABI of a contract. Returns `None` when the API has no ABI for the
    /// address, which is the case for every unverified contract.
    #[tracing::instrument(name = "Fetching ABI", skip(self))]
    pub async fn get_abi(&self, address: &str) -> Result<Option<Abi>> {
        let response =
            self.query(&[("module", "contract"), ("action", "getabi"), ("address", address)]).await?;
        if !response.is_ok() {
            tracing::debug!(api_message = %response.message, result = %response.result, "No ABI");
            return Ok(None)
        }

        let encoded = response.result.as_str().ok_or_else(|| {
            AnalyzerError::Explorer(format!("unexpected getabi result: {}", response.result))
        })?;
        Ok(Some(serde_json::from_str::<Abi>(encoded)?))
    }

    /// Returns whether the contract source has been published and matched against the deployed
    /// bytecode.
    #[tracing::instrument(name = "Checking verification", skip(self))]
    pub async fn is_verified(&self, address: &str) -> Result<bool> {
        let response = self
            .query(&[("module", "contract"), ("action", "getsourcecode"), ("address", address)])
            .await?;
        if !response.is_ok() {
            return Ok(false)
        }

        let records: Vec<SourceCodeResult> = serde_json::from_value(response.result)?;
        Ok(records.first().map(|record| !record.source_code.is_empty()).unwrap_or(false))
    }

    /// Fetches the creator and creation transaction of a contract.
    #[tracing::instrument(name = "Fetching creation info", skip(self))]
    pub async fn contract_creation(&self, address: &str) -> Result<Option<CreationInfo>> {
        let response = self
            .query(&[
                ("module", "contract"),
                ("action", "getcontractcreation"),
                ("contractaddresses", address),
            ])
            .await?;
        if !response.is_ok() {
            return Ok(None)
        }

        let records: Vec<CreationInfo> = serde_json::from_value(response.result)?;
        Ok(records.into_iter().next())
    }
}
