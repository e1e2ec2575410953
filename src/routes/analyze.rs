use crate::{
    analysis::{AnalysisResult, Analyzer, ContractRef},
    report::{self, Charts, Summary, TableRow},
};
use axum::{
    extract::{Query, State},
    http,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of contracts accepted in one batch request.
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchRequest {
    pub contracts: Vec<ContractRef>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchResponse {
    pub results: Vec<AnalysisResult>,
    pub table: Vec<TableRow>,
    pub charts: Charts,
    pub summary: Summary,
}

#[tracing::instrument(
    name = "Analyzing contract",
    skip(analyzer, contract),
    fields(address = %contract.address)
)]
pub async fn analyze(
    State(analyzer): State<Analyzer>,
    Query(contract): Query<ContractRef>,
) -> Json<AnalysisResult> {
    Json(analyzer.analyze_contract(&contract).await)
}

#[tracing::instrument(
    name = "Analyzing batch",
    skip(analyzer, request),
    fields(contracts = request.contracts.len())
)]
pub async fn analyze_batch(
    State(analyzer): State<Analyzer>,
    Json(request): Json<BatchRequest>,
) -> Response {
    let contracts = request.contracts;
    if contracts.is_empty() {
        return (http::StatusCode::BAD_REQUEST, "Enter at least one contract address").into_response()
    }
    if contracts.len() > MAX_BATCH_SIZE {
        return (
            http::StatusCode::BAD_REQUEST,
            format!("At most {MAX_BATCH_SIZE} contracts can be analyzed at once"),
        )
            .into_response()
    }

    let mut on_progress = |fraction: f64, description: &str| {
        tracing::info!(progress = fraction, description, "Batch progress");
    };
    let results = analyzer.analyze_many(&contracts, Some(&mut on_progress)).await;

    let response = BatchResponse {
        table: report::to_table(&results),
        charts: Charts::from_results(&results),
        summary: report::summarize(&results),
        results,
    };
    (http::StatusCode::OK, Json(response)).into_response()
}
