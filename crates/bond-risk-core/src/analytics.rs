//! Bond enrichment: turning `BondTerms` into fully priced `Bond`s.
//!
//! The presentation layer hands a list of bonds to an analytics executor and
//! reads back the same list with derived metrics attached. The executor can
//! run in-process or as an external program speaking the same JSON contract.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::bonds::types::{Bond, BondTerms};
use crate::error::BondRiskError;
use crate::BondRiskResult;

/// The `{"bonds": [...]}` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichRequest {
    pub bonds: Vec<BondTerms>,
}

/// The `{"bonds": [...]}` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichResponse {
    pub bonds: Vec<Bond>,
}

/// Anything that can attach analytics to a bond list.
pub trait BondAnalytics {
    fn enrich(&self, terms: &[BondTerms]) -> BondRiskResult<Vec<Bond>>;
}

/// Pricing and credit model run in the calling process.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessAnalytics;

impl BondAnalytics for InProcessAnalytics {
    fn enrich(&self, terms: &[BondTerms]) -> BondRiskResult<Vec<Bond>> {
        price_universe(terms)
    }
}

/// An external program reading a request on stdin and writing a response
/// on stdout.
#[derive(Debug, Clone)]
pub struct ExternalProcessAnalytics {
    pub program: String,
    pub args: Vec<String>,
}

impl ExternalProcessAnalytics {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl BondAnalytics for ExternalProcessAnalytics {
    fn enrich(&self, terms: &[BondTerms]) -> BondRiskResult<Vec<Bond>> {
        let request = serde_json::to_vec(&EnrichRequest {
            bonds: terms.to_vec(),
        })?;

        debug!(program = %self.program, bonds = terms.len(), "spawning analytics executor");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BondRiskError::Executor(format!("failed to spawn {}: {e}", self.program)))?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| BondRiskError::Executor("executor stdin unavailable".into()))?;
            stdin
                .write_all(&request)
                .map_err(|e| BondRiskError::Executor(format!("failed to write request: {e}")))?;
        }
        // Close stdin so the child sees EOF.
        drop(child.stdin.take());

        let output = child
            .wait_with_output()
            .map_err(|e| BondRiskError::Executor(format!("executor did not finish: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BondRiskError::Executor(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let response: EnrichResponse = serde_json::from_slice(&output.stdout)
            .map_err(|e| BondRiskError::Executor(format!("unreadable executor response: {e}")))?;
        if response.bonds.len() != terms.len() {
            return Err(BondRiskError::Executor(format!(
                "executor returned {} bonds for {} requested",
                response.bonds.len(),
                terms.len()
            )));
        }
        Ok(response.bonds)
    }
}

/// Price every bond in order. Fails on the first invalid bond.
pub fn price_universe(terms: &[BondTerms]) -> BondRiskResult<Vec<Bond>> {
    terms.iter().cloned().map(Bond::from_terms).collect()
}

/// Enrich a `{"bonds": [...]}` JSON payload in-process.
pub fn enrich_payload(payload: &serde_json::Value) -> BondRiskResult<serde_json::Value> {
    let request: EnrichRequest = serde_json::from_value(payload.clone())?;
    let bonds = InProcessAnalytics.enrich(&request.bonds)?;
    info!(bonds = bonds.len(), "enriched bond payload");
    Ok(serde_json::to_value(EnrichResponse { bonds })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonds::generator::generate_terms;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_in_process_matches_from_terms() {
        let terms = generate_terms(7, 5).unwrap();
        let bonds = InProcessAnalytics.enrich(&terms).unwrap();
        assert_eq!(bonds.len(), 5);
        for (t, b) in terms.iter().zip(&bonds) {
            assert_eq!(&b.terms, t);
            assert_eq!(b, &Bond::from_terms(t.clone()).unwrap());
        }
    }

    #[test]
    fn test_enrich_payload_camel_case_contract() {
        let payload = json!({
            "bonds": [{
                "id": 1,
                "name": "U.S. Treasury",
                "type": "Government",
                "sector": "Government",
                "rating": "AA+",
                "couponRate": "3",
                "maturityYears": 10,
                "faceValue": "1000",
                "yieldToMaturity": "3"
            }]
        });
        let out = enrich_payload(&payload).unwrap();
        let bond = &out["bonds"][0];
        assert_eq!(bond["issuer"], "U.S. Treasury");
        assert_eq!(bond["type"], "Government");
        assert!(bond.get("marketPrice").is_some());
        assert!(bond.get("yieldToMaturity").is_some());
        assert_eq!(bond["cashflows"].as_array().map(|a| a.len()), Some(10));

        let back: EnrichResponse = serde_json::from_value(out).unwrap();
        assert!((back.bonds[0].market_price() - dec!(1000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_enrich_payload_rejects_bad_bond() {
        let payload = json!({
            "bonds": [{
                "id": 1, "issuer": "X", "type": "Corporate", "sector": "Energy",
                "rating": "BBB", "couponRate": "5", "maturityYears": 0,
                "faceValue": "1000", "yieldToMaturity": "5"
            }]
        });
        assert!(matches!(
            enrich_payload(&payload),
            Err(BondRiskError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_enrich_payload_prices_unknown_sector_at_fallback_lgd() {
        let payload = json!({
            "bonds": [{
                "id": 4, "issuer": "Acme Mining", "type": "Corporate", "sector": "Materials",
                "rating": "BBB", "couponRate": "5", "maturityYears": 5,
                "faceValue": "1000", "yieldToMaturity": "5"
            }]
        });
        let out = enrich_payload(&payload).unwrap();
        let bond = &out["bonds"][0];
        assert_eq!(bond["sector"], "Other");
        let back: EnrichResponse = serde_json::from_value(out).unwrap();
        assert_eq!(back.bonds[0].metrics.lgd, dec!(40));
    }

    #[test]
    fn test_enrich_payload_out_of_range_discounting_is_input_error() {
        let payload = json!({
            "bonds": [{
                "id": 1, "issuer": "X", "type": "Government", "sector": "Government",
                "rating": "AAA", "couponRate": "3", "maturityYears": 40,
                "faceValue": "1000", "yieldToMaturity": "-90"
            }]
        });
        assert!(matches!(
            enrich_payload(&payload),
            Err(BondRiskError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_enrich_payload_rejects_malformed_json() {
        let err = enrich_payload(&json!({"nope": []})).unwrap_err();
        assert!(matches!(err, BondRiskError::SerializationError(_)));
    }

    #[test]
    fn test_missing_executor_is_recoverable() {
        let exec = ExternalProcessAnalytics::new("/nonexistent/bond-analytics-executor", vec![]);
        let terms = generate_terms(1, 2).unwrap();
        let err = exec.enrich(&terms).unwrap_err();
        assert!(matches!(err, BondRiskError::Executor(_)));
        assert!(err.is_collaborator_failure());
    }
}
