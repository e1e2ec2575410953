use crate::{
    errors::{AnalyzerError, Result},
    explorer::CreationInfo,
    gateway::ContractGateway,
    provider::{parse_address, CallArgs},
    scoring::{calculate_security_score, check_vesting_functions, RiskLevel},
};
use chrono::{DateTime, Utc};
use ethers::{
    abi::Abi,
    types::{Address, U256},
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

/// Token amounts are reported in whole tokens, assuming 18 decimals.
pub const WEI_PER_TOKEN: f64 = 1e18;

/// Default delay between two analyses of a batch.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(200);

/// Progress callback of a batch: receives the completed fraction and a description.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(f64, &str) + Send);

/// A contract to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRef {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Holder passed to amount getters. Defaults to the contract itself.
    #[serde(default)]
    pub beneficiary: Option<String>,
}

impl ContractRef {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), name: None, beneficiary: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_beneficiary(mut self, beneficiary: impl Into<String>) -> Self {
        self.beneficiary = Some(beneficiary.into());
        self
    }

    /// The given name, or `Contract_` followed by the first 8 characters of the address.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Contract_{}", prefix(&self.address, 8)),
        }
    }
}

fn prefix(s: &str, len: usize) -> &str {
    s.char_indices().nth(len).map(|(i, _)| &s[..i]).unwrap_or(s)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Success,
    Error,
}

/// Amounts read from the contract, in whole tokens. Each one defaults to 0.0 when it could not be
/// read.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenAmounts {
    pub vested_amount: f64,
    pub released_amount: f64,
    pub releasable_amount: f64,
    pub total_supply: f64,
}

/// Outcome of analyzing a single contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub name: String,
    pub address: String,
    pub beneficiary: Option<String>,
    pub status: AnalysisStatus,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub security_score: u8,
    pub risk_level: RiskLevel,
    pub vesting_functions_found: Vec<String>,
    pub all_functions_count: usize,
    pub is_verified: bool,
    pub creation_info: Option<CreationInfo>,
    /// Absent when the analysis failed.
    pub token_amounts: Option<TokenAmounts>,
}

impl AnalysisResult {
    fn failure(contract: &ContractRef, timestamp: DateTime<Utc>, error: String) -> Self {
        Self {
            name: contract.display_name(),
            address: contract.address.clone(),
            beneficiary: contract.beneficiary.clone(),
            status: AnalysisStatus::Error,
            error: Some(error),
            timestamp,
            security_score: 0,
            risk_level: RiskLevel::Error,
            vesting_functions_found: Vec::new(),
            all_functions_count: 0,
            is_verified: false,
            creation_info: None,
            token_amounts: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AnalysisStatus::Success
    }
}

/// Names of all functions declared in the ABI.
pub fn function_inventory(abi: &Abi) -> Vec<String> {
    abi.functions().map(|f| f.name.clone()).filter(|name| !name.is_empty()).collect()
}

fn to_token_units(value: U256) -> f64 {
    value.to_string().parse::<f64>().map(|v| v / WEI_PER_TOKEN).unwrap_or(0.0)
}

/// Runs contract analyses against a gateway.
#[derive(Clone)]
pub struct Analyzer {
    gateway: Arc<dyn ContractGateway>,
    rate_limit: Duration,
}

impl Analyzer {
    pub fn new(gateway: Arc<dyn ContractGateway>) -> Self {
        Self { gateway, rate_limit: DEFAULT_RATE_LIMIT }
    }

    /// Sets the delay applied after every analysis of a batch.
    pub fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Analyzes one contract. Never fails: any error is reported in the returned result with an
    /// `error` status, a zero score and the `ERROR` risk level.
    #[tracing::instrument(
        name = "Analyzing contract",
        skip(self, contract),
        fields(address = %contract.address, name = ?contract.name)
    )]
    pub async fn analyze_contract(&self, contract: &ContractRef) -> AnalysisResult {
        let timestamp = Utc::now();
        match self.try_analyze(contract, timestamp).await {
            Ok(result) => {
                tracing::info!(
                    score = result.security_score,
                    risk = %result.risk_level,
                    "Analysis complete"
                );
                result
            }
            Err(e) => {
                tracing::warn!(error = %e, "Analysis failed");
                AnalysisResult::failure(contract, timestamp, e.to_string())
            }
        }
    }

    async fn try_analyze(
        &self,
        contract: &ContractRef,
        timestamp: DateTime<Utc>,
    ) -> Result<AnalysisResult> {
        let address = parse_address(&contract.address)?;
        let holder = match contract.beneficiary.as_deref() {
            Some(beneficiary) => parse_address(beneficiary)?,
            None => address,
        };

        if !self.gateway.has_code(address).await? {
            return Err(AnalyzerError::NotAContract(contract.address.clone()))
        }

        let abi = self
            .gateway
            .fetch_abi(address)
            .await?
            .ok_or_else(|| AnalyzerError::AbiUnavailable(contract.address.clone()))?;
        let functions = function_inventory(&abi);
        let flags = check_vesting_functions(&functions);

        let is_verified = self.gateway.is_verified(address).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Verification lookup failed, assuming unverified");
            false
        });
        let security_score = calculate_security_score(&flags, is_verified);

        let token_amounts = self.token_amounts(address, &abi, holder).await;

        let creation_info = self.gateway.creation_info(address).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Creation info lookup failed");
            None
        });

        Ok(AnalysisResult {
            name: contract.display_name(),
            address: contract.address.clone(),
            beneficiary: contract.beneficiary.clone(),
            status: AnalysisStatus::Success,
            error: None,
            timestamp,
            security_score,
            risk_level: RiskLevel::from_score(security_score),
            vesting_functions_found: flags.found(),
            all_functions_count: functions.len(),
            is_verified,
            creation_info,
            token_amounts: Some(token_amounts),
        })
    }

    async fn token_amounts(&self, contract: Address, abi: &Abi, holder: Address) -> TokenAmounts {
        let holder = Some(holder);
        TokenAmounts {
            vested_amount: self.read_amount(contract, abi, "vestedAmount", holder).await,
            released_amount: self.read_amount(contract, abi, "released", holder).await,
            releasable_amount: self.read_amount(contract, abi, "releasable", holder).await,
            total_supply: self.read_amount(contract, abi, "totalSupply", None).await,
        }
    }

    /// Tries the no-argument form first, then the holder form if a holder is given. Yields 0.0
    /// when every attempt fails.
    async fn read_amount(
        &self,
        contract: Address,
        abi: &Abi,
        function: &str,
        holder: Option<Address>,
    ) -> f64 {
        let attempts = std::iter::once(CallArgs::None).chain(holder.map(CallArgs::Holder));
        for args in attempts {
            match self.gateway.read_uint(contract, abi, function, args).await {
                Ok(Some(value)) => return to_token_units(value),
                Ok(None) => {}
                Err(e) => tracing::debug!(function, ?args, error = %e, "Read call failed"),
            }
        }
        0.0
    }

    /// Analyzes contracts one after the other, sleeping for the configured rate limit after each
    /// one. Returns one result per input, in input order.
    ///
    /// `on_progress` is called before every contract with the fraction already done, and once
    /// more with `1.0` at the end.
    pub async fn analyze_many(
        &self,
        contracts: &[ContractRef],
        mut on_progress: Option<ProgressFn<'_>>,
    ) -> Vec<AnalysisResult> {
        let total = contracts.len();
        let mut results = Vec::with_capacity(total);

        for (index, contract) in contracts.iter().enumerate() {
            if let Some(report) = on_progress.as_deref_mut() {
                let label = match contract.name.as_deref() {
                    Some(name) if !name.is_empty() => name,
                    _ => prefix(&contract.address, 10),
                };
                report(index as f64 / total as f64, &format!("Analyzing {label}..."));
            }

            results.push(self.analyze_contract(contract).await);
            tokio::time::sleep(self.rate_limit).await;
        }

        if let Some(report) = on_progress.as_deref_mut() {
            report(1.0, "Analysis complete");
        }
        results
    }
}
