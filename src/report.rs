use crate::{
    analysis::{AnalysisResult, AnalysisStatus},
    scoring::{RiskLevel, MAX_SCORE},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names of the tabular projection, in order.
pub const TABLE_COLUMNS: [&str; 7] = [
    "name",
    "address",
    "security_score",
    "risk_level",
    "vested_amount",
    "released_amount",
    "releasable_amount",
];

/// One row of the tabular projection. Missing values serialize as `null`, they are never omitted,
/// and serde keeps the field order of [`TABLE_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub name: Option<String>,
    pub address: Option<String>,
    pub security_score: Option<u8>,
    pub risk_level: Option<RiskLevel>,
    pub vested_amount: Option<f64>,
    pub released_amount: Option<f64>,
    pub releasable_amount: Option<f64>,
}

impl From<&AnalysisResult> for TableRow {
    fn from(result: &AnalysisResult) -> Self {
        let amounts = result.token_amounts.as_ref();
        Self {
            name: Some(result.name.clone()),
            address: Some(result.address.clone()),
            security_score: Some(result.security_score),
            risk_level: Some(result.risk_level),
            vested_amount: amounts.map(|a| a.vested_amount),
            released_amount: amounts.map(|a| a.released_amount),
            releasable_amount: amounts.map(|a| a.releasable_amount),
        }
    }
}

pub fn to_table(results: &[AnalysisResult]) -> Vec<TableRow> {
    results.iter().map(TableRow::from).collect()
}

/// A labelled value of a bar or pie chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Chart-ready series. Rendering is left to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
    pub points: Vec<ChartPoint>,
    /// Fixed value axis, for bar charts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
}

/// Security score per contract, on a fixed 0-100 axis.
pub fn security_chart(results: &[AnalysisResult]) -> Chart {
    Chart {
        title: "Contract Security Scores".into(),
        kind: ChartKind::Bar,
        points: results
            .iter()
            .map(|r| ChartPoint { label: r.name.clone(), value: r.security_score as f64 })
            .collect(),
        y_range: Some([0.0, MAX_SCORE as f64]),
    }
}

/// Vested amount per successfully analyzed contract. Contracts with nothing vested are left out
/// since they would not show on a pie chart anyway.
pub fn token_chart(results: &[AnalysisResult]) -> Chart {
    Chart {
        title: "Token Distribution".into(),
        kind: ChartKind::Pie,
        points: results
            .iter()
            .filter_map(|r| {
                let vested = r.token_amounts.as_ref()?.vested_amount;
                (vested > 0.0).then(|| ChartPoint { label: r.name.clone(), value: vested })
            })
            .collect(),
        y_range: None,
    }
}

/// Number of contracts per risk level, in `LOW, MEDIUM, HIGH, ERROR` order.
pub fn risk_chart(results: &[AnalysisResult]) -> Chart {
    Chart {
        title: "Risk Distribution".into(),
        kind: ChartKind::Pie,
        points: RiskLevel::ALL
            .iter()
            .map(|level| ChartPoint {
                label: level.to_string(),
                value: results.iter().filter(|r| r.risk_level == *level).count() as f64,
            })
            .collect(),
        y_range: None,
    }
}

/// All charts of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charts {
    pub security: Chart,
    pub tokens: Chart,
    pub risk: Chart,
}

impl Charts {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        Self {
            security: security_chart(results),
            tokens: token_chart(results),
            risk: risk_chart(results),
        }
    }
}

/// Aggregate figures of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Mean score over successful analyses, 0 when there are none.
    pub average_score: f64,
    pub high_risk: usize,
    pub total_vested: f64,
}

pub fn summarize(results: &[AnalysisResult]) -> Summary {
    let successes: Vec<&AnalysisResult> = results.iter().filter(|r| r.is_success()).collect();
    let average_score = if successes.is_empty() {
        0.0
    } else {
        successes.iter().map(|r| r.security_score as f64).sum::<f64>() / successes.len() as f64
    };

    Summary {
        total: results.len(),
        successful: successes.len(),
        failed: results.len() - successes.len(),
        average_score,
        high_risk: results.iter().filter(|r| r.risk_level == RiskLevel::High).count(),
        total_vested: successes
            .iter()
            .filter_map(|r| r.token_amounts.as_ref())
            .map(|a| a.vested_amount)
            .sum(),
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Contracts analyzed: {}", self.total)?;
        writeln!(f, "Successful: {} | Failed: {}", self.successful, self.failed)?;
        writeln!(f, "Average security score: {:.1}/100", self.average_score)?;
        writeln!(f, "High risk contracts: {}", self.high_risk)?;
        write!(f, "Total vested: {:.4}", self.total_vested)
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "═══════════════════════════════════════════════════════════")?;
        writeln!(f, "              VESTING CONTRACT ANALYSIS")?;
        writeln!(f, "═══════════════════════════════════════════════════════════")?;
        writeln!(f, "Name:      {}", self.name)?;
        writeln!(f, "Address:   {}", self.address)?;
        if let Some(beneficiary) = &self.beneficiary {
            writeln!(f, "Holder:    {beneficiary}")?;
        }
        writeln!(f, "Analyzed:  {}", self.timestamp.to_rfc3339())?;
        writeln!(f)?;

        if self.status == AnalysisStatus::Error {
            writeln!(f, "Status:    ERROR")?;
            writeln!(f, "Reason:    {}", self.error.as_deref().unwrap_or("unknown"))?;
            return Ok(())
        }

        writeln!(f, "Security score: {}/100 ({} risk)", self.security_score, self.risk_level)?;
        writeln!(f, "Verified source: {}", if self.is_verified { "yes" } else { "no" })?;
        writeln!(
            f,
            "Vesting functions: {}/{} ({})",
            self.vesting_functions_found.len(),
            self.all_functions_count,
            self.vesting_functions_found.join(", ")
        )?;

        if let Some(amounts) = &self.token_amounts {
            writeln!(f)?;
            writeln!(f, "Vested:     {:.4}", amounts.vested_amount)?;
            writeln!(f, "Released:   {:.4}", amounts.released_amount)?;
            writeln!(f, "Releasable: {:.4}", amounts.releasable_amount)?;
            writeln!(f, "Supply:     {:.4}", amounts.total_supply)?;
        }

        if let Some(creation) = &self.creation_info {
            writeln!(f)?;
            writeln!(f, "Creator:    {}", creation.contract_creator)?;
            writeln!(f, "Created in: {}", creation.tx_hash)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TokenAmounts;
    use chrono::Utc;

    fn result(name: &str, score: u8, amounts: Option<TokenAmounts>) -> AnalysisResult {
        let failed = amounts.is_none();
        AnalysisResult {
            name: name.into(),
            address: format!("0x{name}"),
            beneficiary: None,
            status: if failed { AnalysisStatus::Error } else { AnalysisStatus::Success },
            error: failed.then(|| "Unable to fetch the contract ABI".to_string()),
            timestamp: Utc::now(),
            security_score: score,
            risk_level: if failed { RiskLevel::Error } else { RiskLevel::from_score(score) },
            vesting_functions_found: vec![],
            all_functions_count: 0,
            is_verified: false,
            creation_info: None,
            token_amounts: amounts,
        }
    }

    fn vested(amount: f64) -> Option<TokenAmounts> {
        Some(TokenAmounts { vested_amount: amount, ..Default::default() })
    }

    #[test]
    fn table_rows_always_have_seven_ordered_columns() {
        let results = vec![result("ok", 85, vested(12.5)), result("broken", 0, None)];

        for row in to_table(&results) {
            let json = serde_json::to_value(&row).unwrap();
            let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
            assert_eq!(keys.len(), TABLE_COLUMNS.len());

            // Object key order is not preserved by `serde_json::Value`, so check it on the text.
            let text = serde_json::to_string(&row).unwrap();
            let positions: Vec<usize> =
                TABLE_COLUMNS.iter().map(|c| text.find(&format!("\"{c}\"")).unwrap()).collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }

        let json = serde_json::to_value(&to_table(&results)[1]).unwrap();
        assert_eq!(json["risk_level"], "ERROR");
        assert!(json["vested_amount"].is_null());
        assert!(json["releasable_amount"].is_null());
    }

    #[test]
    fn charts_cover_scores_tokens_and_risk() {
        let results = vec![
            result("a", 85, vested(10.0)),
            result("b", 45, vested(0.0)),
            result("c", 10, vested(5.0)),
            result("d", 0, None),
        ];
        let charts = Charts::from_results(&results);

        assert_eq!(charts.security.points.len(), 4);
        assert_eq!(charts.security.y_range, Some([0.0, 100.0]));

        let labels: Vec<&str> = charts.tokens.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "c"]);

        let counts: Vec<(String, f64)> =
            charts.risk.points.iter().map(|p| (p.label.clone(), p.value)).collect();
        assert_eq!(
            counts,
            vec![
                ("LOW".to_string(), 1.0),
                ("MEDIUM".to_string(), 1.0),
                ("HIGH".to_string(), 1.0),
                ("ERROR".to_string(), 1.0),
            ]
        );
    }

    #[test]
    fn summary_ignores_failures_in_averages() {
        let results =
            vec![result("a", 80, vested(10.0)), result("b", 20, vested(2.5)), result("c", 0, None)];
        let summary = summarize(&results);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.average_score, 50.0);
        assert_eq!(summary.high_risk, 1);
        assert_eq!(summary.total_vested, 12.5);
        assert!(summary.to_string().contains("Average security score: 50.0/100"));

        assert_eq!(summarize(&[]).average_score, 0.0);
    }

    #[test]
    fn report_shows_error_reason() {
        let text = result("broken", 0, None).to_string();
        assert!(text.contains("Status:    ERROR"));
        assert!(text.contains("Unable to fetch the contract ABI"));

        let text = result("ok", 85, vested(1.0)).to_string();
        assert!(text.contains("Security score: 85/100 (LOW risk)"));
        assert!(text.contains("Vested:     1.0000"));
    }
}
