pub mod generator;
pub mod types;

pub use generator::{generate, generate_terms, indicative_yield_pct};
pub use types::{Bond, BondMetrics, BondTerms, BondType, Cashflow, CreditRating, Sector};
