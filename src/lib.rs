#![doc = include_str!("../README.md")]

/// Runs the per-contract analysis and the rate-limited batch loop on top of a gateway.
pub mod analysis;

/// Handles all app configuration.
pub mod config;

/// Error type shared by the whole crate.
pub mod errors;

/// Client for Etherscan-style contract metadata APIs.
pub mod explorer;

/// Defines the `ContractGateway` trait the analyzer talks to, and its production implementation.
pub mod gateway;

/// Supported networks and their endpoints.
pub mod network;

/// Contains methods and types for interacting with an Ethereum provider.
pub mod provider;

/// Table, chart and summary projections of analysis results.
pub mod report;

/// Defines the handlers for all API routes.
pub mod routes;

/// Keyword flags, security score and risk level.
pub mod scoring;

/// Handles the server startup, such as route configuration and middleware.
pub mod startup;

/// Handles logs and tracing.
pub mod telemetry;

pub use analysis::{AnalysisResult, AnalysisStatus, Analyzer, ContractRef, TokenAmounts};
pub use errors::{AnalyzerError, Result};
pub use scoring::RiskLevel;
