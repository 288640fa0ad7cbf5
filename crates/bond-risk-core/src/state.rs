//! Portfolio state and its persistence.
//!
//! A portfolio is a total market value plus a weight map, stored under a
//! company identifier with upsert semantics. Store failures never stop the
//! engine: loading falls back to equal weights and the default size.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

use crate::bonds::types::Bond;
use crate::error::BondRiskError;
use crate::portfolio::weights::{build_equal_weights, WeightMap};
use crate::types::{BondId, Money};
use crate::BondRiskResult;

/// Identifier the single stored portfolio lives under.
pub const DEFAULT_COMPANY: &str = "default";

pub const DEFAULT_TOTAL_MARKET_VALUE: Money = dec!(50000000);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Persisted shape: `{"totalMarketValue": 5e7, "weights": {"1": 2.0}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRecord {
    pub total_market_value: f64,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

/// Typed portfolio state used by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub total_market_value: Money,
    pub weights: WeightMap,
}

/// Where a loaded state came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateSource {
    Persisted,
    /// No record stored yet
    Default,
    /// The store failed; defaults were used instead
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateLoad {
    pub state: PortfolioState,
    pub source: StateSource,
}

impl PortfolioState {
    /// Equal weights across `bonds` at the given size.
    pub fn equal_weighted(bonds: &[Bond], total_market_value: Money) -> Self {
        Self {
            total_market_value,
            weights: build_equal_weights(bonds),
        }
    }

    /// Validate and convert a persisted record.
    pub fn from_record(record: &PortfolioRecord) -> BondRiskResult<Self> {
        if !record.total_market_value.is_finite() || record.total_market_value < 0.0 {
            return Err(BondRiskError::invalid(
                "totalMarketValue",
                format!(
                    "Total market value must be a finite non-negative number, got {}.",
                    record.total_market_value
                ),
            ));
        }
        let total_market_value = decimal_from(record.total_market_value, "totalMarketValue")?;

        let mut weights = WeightMap::new();
        for (key, value) in &record.weights {
            let id: BondId = key.trim().parse().map_err(|_| {
                BondRiskError::invalid("weights", format!("Bond id '{key}' is not an integer."))
            })?;
            if !value.is_finite() {
                return Err(BondRiskError::invalid(
                    "weights",
                    format!("Weight for bond {id} is not finite."),
                ));
            }
            weights.insert(id, decimal_from(*value, "weights")?);
        }

        Ok(Self {
            total_market_value,
            weights,
        })
    }

    pub fn to_record(&self) -> BondRiskResult<PortfolioRecord> {
        let total_market_value = self.total_market_value.to_f64().ok_or_else(|| {
            BondRiskError::invalid("total_market_value", "Not representable as f64.")
        })?;
        let weights = self
            .weights
            .iter()
            .map(|(id, w)| {
                w.to_f64()
                    .map(|v| (id.to_string(), v))
                    .ok_or_else(|| BondRiskError::invalid("weights", "Not representable as f64."))
            })
            .collect::<BondRiskResult<BTreeMap<String, f64>>>()?;
        Ok(PortfolioRecord {
            total_market_value,
            weights,
        })
    }
}

fn decimal_from(value: f64, field: &str) -> BondRiskResult<Decimal> {
    Decimal::from_f64(value)
        .ok_or_else(|| BondRiskError::invalid(field, format!("{value} is out of range.")))
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Key-value persistence for portfolio records, keyed by company.
pub trait PortfolioStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    fn load(&self, company: &str) -> BondRiskResult<Option<PortfolioRecord>>;

    /// Insert or replace the record for `company`.
    fn save(&self, company: &str, record: &PortfolioRecord) -> BondRiskResult<()>;

    /// Returns whether a record existed.
    fn remove(&self, company: &str) -> BondRiskResult<bool>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, PortfolioRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PortfolioStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn load(&self, company: &str) -> BondRiskResult<Option<PortfolioRecord>> {
        Ok(self
            .records
            .read()
            .map_err(|e| BondRiskError::Storage(format!("Lock error: {e}")))?
            .get(company)
            .cloned())
    }

    fn save(&self, company: &str, record: &PortfolioRecord) -> BondRiskResult<()> {
        self.records
            .write()
            .map_err(|e| BondRiskError::Storage(format!("Lock error: {e}")))?
            .insert(company.to_string(), record.clone());
        Ok(())
    }

    fn remove(&self, company: &str) -> BondRiskResult<bool> {
        Ok(self
            .records
            .write()
            .map_err(|e| BondRiskError::Storage(format!("Lock error: {e}")))?
            .remove(company)
            .is_some())
    }
}

/// One `<company>.json` file per record in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, company: &str) -> PathBuf {
        let file: String = company
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl PortfolioStore for JsonFileStore {
    fn backend_name(&self) -> &'static str {
        "json_file"
    }

    fn load(&self, company: &str) -> BondRiskResult<Option<PortfolioRecord>> {
        let path = self.path_for(company);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BondRiskError::Storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        let record = serde_json::from_str(&content).map_err(|e| {
            BondRiskError::Storage(format!("Corrupt record {}: {e}", path.display()))
        })?;
        Ok(Some(record))
    }

    fn save(&self, company: &str, record: &PortfolioRecord) -> BondRiskResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            BondRiskError::Storage(format!("Failed to create {}: {e}", self.dir.display()))
        })?;
        let path = self.path_for(company);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(record)?;
        fs::write(&tmp, body)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| BondRiskError::Storage(format!("Failed to write {}: {e}", path.display())))?;
        debug!(path = %path.display(), "portfolio record saved");
        Ok(())
    }

    fn remove(&self, company: &str) -> BondRiskResult<bool> {
        let path = self.path_for(company);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BondRiskError::Storage(format!(
                "Failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load the portfolio for `company`, falling back to equal weights over
/// `bonds` and `default_total` when nothing is stored or the store fails.
///
/// A record that exists but holds invalid values is an error, not a fallback.
pub fn load_portfolio_state(
    store: &dyn PortfolioStore,
    company: &str,
    bonds: &[Bond],
    default_total: Money,
) -> BondRiskResult<StateLoad> {
    match store.load(company) {
        Ok(Some(record)) => {
            let state = PortfolioState::from_record(&record)?;
            debug!(company, backend = store.backend_name(), "loaded persisted portfolio");
            Ok(StateLoad {
                state,
                source: StateSource::Persisted,
            })
        }
        Ok(None) => Ok(StateLoad {
            state: PortfolioState::equal_weighted(bonds, default_total),
            source: StateSource::Default,
        }),
        Err(e) if e.is_collaborator_failure() => {
            warn!(company, backend = store.backend_name(), error = %e, "portfolio store unavailable, using defaults");
            Ok(StateLoad {
                state: PortfolioState::equal_weighted(bonds, default_total),
                source: StateSource::Fallback {
                    reason: e.to_string(),
                },
            })
        }
        Err(e) => Err(e),
    }
}

/// Upsert `state` for `company`.
pub fn save_portfolio_state(
    store: &dyn PortfolioStore,
    company: &str,
    state: &PortfolioState,
) -> BondRiskResult<()> {
    let record = state.to_record()?;
    store.save(company, &record)
}
