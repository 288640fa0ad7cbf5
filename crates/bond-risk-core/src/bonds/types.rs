use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::credit::default_model::credit_metrics;
use crate::error::BondRiskError;
use crate::fixed_income::pricing::price;
use crate::types::{BondId, Money, Percent};
use crate::BondRiskResult;

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BondType {
    Government,
    Corporate,
}

impl BondType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BondType::Government => "Government",
            BondType::Corporate => "Corporate",
        }
    }
}

impl fmt::Display for BondType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issuer sector. Governments always carry `Sector::Government`.
///
/// Sector names outside the table deserialize to `Other`, which carries the
/// fallback corporate LGD, in the same way unknown ratings become `NotRated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sector {
    Government,
    Banking,
    Technology,
    Healthcare,
    Energy,
    Utilities,
    Telecom,
    Industrials,
    Consumer,
    FinancialServices,
    Other,
}

impl Sector {
    pub const ALL: [Sector; 11] = [
        Sector::Government,
        Sector::Banking,
        Sector::Technology,
        Sector::Healthcare,
        Sector::Energy,
        Sector::Utilities,
        Sector::Telecom,
        Sector::Industrials,
        Sector::Consumer,
        Sector::FinancialServices,
        Sector::Other,
    ];

    /// Sectors a corporate issuer can belong to.
    pub const CORPORATE: [Sector; 9] = [
        Sector::Banking,
        Sector::Technology,
        Sector::Healthcare,
        Sector::Energy,
        Sector::Utilities,
        Sector::Telecom,
        Sector::Industrials,
        Sector::Consumer,
        Sector::FinancialServices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Government => "Government",
            Sector::Banking => "Banking",
            Sector::Technology => "Technology",
            Sector::Healthcare => "Healthcare",
            Sector::Energy => "Energy",
            Sector::Utilities => "Utilities",
            Sector::Telecom => "Telecom",
            Sector::Industrials => "Industrials",
            Sector::Consumer => "Consumer",
            Sector::FinancialServices => "Financial Services",
            Sector::Other => "Other",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sector {
    type Err = BondRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sector::ALL
            .iter()
            .copied()
            .find(|sector| sector.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BondRiskError::invalid("sector", format!("Unknown sector '{s}'")))
    }
}

impl From<String> for Sector {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Sector::Other)
    }
}

impl From<Sector> for String {
    fn from(sector: Sector) -> Self {
        sector.as_str().to_string()
    }
}

/// Agency-style credit rating, ordered from highest quality (AAA) down.
///
/// Unrecognised rating strings deserialize to `NotRated` rather than failing,
/// so externally supplied bond lists with exotic ratings still price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CreditRating {
    AAA,
    AAPlus,
    AA,
    AAMinus,
    APlus,
    A,
    AMinus,
    BBBPlus,
    BBB,
    BBBMinus,
    BBPlus,
    BB,
    BPlus,
    B,
    BMinus,
    CCC,
    NotRated,
}

impl CreditRating {
    pub const ALL: [CreditRating; 17] = [
        CreditRating::AAA,
        CreditRating::AAPlus,
        CreditRating::AA,
        CreditRating::AAMinus,
        CreditRating::APlus,
        CreditRating::A,
        CreditRating::AMinus,
        CreditRating::BBBPlus,
        CreditRating::BBB,
        CreditRating::BBBMinus,
        CreditRating::BBPlus,
        CreditRating::BB,
        CreditRating::BPlus,
        CreditRating::B,
        CreditRating::BMinus,
        CreditRating::CCC,
        CreditRating::NotRated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CreditRating::AAA => "AAA",
            CreditRating::AAPlus => "AA+",
            CreditRating::AA => "AA",
            CreditRating::AAMinus => "AA-",
            CreditRating::APlus => "A+",
            CreditRating::A => "A",
            CreditRating::AMinus => "A-",
            CreditRating::BBBPlus => "BBB+",
            CreditRating::BBB => "BBB",
            CreditRating::BBBMinus => "BBB-",
            CreditRating::BBPlus => "BB+",
            CreditRating::BB => "BB",
            CreditRating::BPlus => "B+",
            CreditRating::B => "B",
            CreditRating::BMinus => "B-",
            CreditRating::CCC => "CCC",
            CreditRating::NotRated => "NR",
        }
    }

    /// BBB- or better. Unrated paper is treated as high yield.
    pub fn is_investment_grade(&self) -> bool {
        *self <= CreditRating::BBBMinus
    }
}

impl fmt::Display for CreditRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreditRating {
    type Err = BondRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        CreditRating::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| BondRiskError::invalid("rating", format!("Unknown rating '{s}'")))
    }
}

impl From<String> for CreditRating {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(CreditRating::NotRated)
    }
}

impl From<CreditRating> for String {
    fn from(rating: CreditRating) -> Self {
        rating.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Bond records
// ---------------------------------------------------------------------------

/// The contractual and market inputs of a bond. Everything else about a
/// bond is derived from these.
///
/// Serialized in camelCase, the shape the presentation layer exchanges
/// with the analytics executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondTerms {
    pub id: BondId,
    #[serde(alias = "name")]
    pub issuer: String,
    #[serde(rename = "type")]
    pub bond_type: BondType,
    pub sector: Sector,
    pub rating: CreditRating,
    /// Annual coupon, in percent of face
    pub coupon_rate: Percent,
    pub maturity_years: u32,
    pub face_value: Money,
    /// Annual yield to maturity, in percent
    pub yield_to_maturity: Percent,
}

/// One annual cashflow of a bullet bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cashflow {
    pub year: u32,
    pub coupon: Money,
    pub principal: Money,
    pub total: Money,
    /// Present value at the bond's yield to maturity
    pub discounted: Money,
}

/// Derived analytics for one unit (one face amount) of a bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondMetrics {
    pub market_price: Money,
    pub macaulay_duration: Decimal,
    /// Modified duration
    pub duration: Decimal,
    pub convexity: Decimal,
    pub pv01: Money,
    pub dv01: Money,
    pub cr01: Money,
    /// Probability of default, percent
    pub pd: Percent,
    /// Loss given default, percent
    pub lgd: Percent,
    pub expected_loss: Money,
    pub cashflows: Vec<Cashflow>,
}

/// A priced bond: its terms plus the metrics computed from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    #[serde(flatten)]
    pub terms: BondTerms,
    #[serde(flatten)]
    pub metrics: BondMetrics,
}

impl Bond {
    /// Price the terms and attach credit metrics. The only way metrics are
    /// ever produced, so they cannot drift from the terms.
    pub fn from_terms(terms: BondTerms) -> BondRiskResult<Bond> {
        let pricing = price(&terms)?;
        let credit = credit_metrics(
            terms.rating,
            terms.sector,
            terms.bond_type,
            pricing.market_price,
        )?;
        let metrics = BondMetrics {
            market_price: pricing.market_price,
            macaulay_duration: pricing.macaulay_duration,
            duration: pricing.duration,
            convexity: pricing.convexity,
            pv01: pricing.pv01,
            dv01: pricing.dv01,
            cr01: pricing.cr01,
            pd: credit.pd,
            lgd: credit.lgd,
            expected_loss: credit.expected_loss,
            cashflows: pricing.cashflows,
        };
        Ok(Bond { terms, metrics })
    }

    /// A new bond with the same terms at a different yield, fully repriced.
    pub fn with_yield(&self, yield_to_maturity: Percent) -> BondRiskResult<Bond> {
        Bond::from_terms(BondTerms {
            yield_to_maturity,
            ..self.terms.clone()
        })
    }

    pub fn id(&self) -> BondId {
        self.terms.id
    }

    pub fn bond_type(&self) -> BondType {
        self.terms.bond_type
    }

    pub fn maturity_years(&self) -> u32 {
        self.terms.maturity_years
    }

    pub fn rating(&self) -> CreditRating {
        self.terms.rating
    }

    pub fn market_price(&self) -> Money {
        self.metrics.market_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn terms() -> BondTerms {
        BondTerms {
            id: 1,
            issuer: "Harbor Energy".into(),
            bond_type: BondType::Corporate,
            sector: Sector::Energy,
            rating: CreditRating::BBB,
            coupon_rate: dec!(5),
            maturity_years: 7,
            face_value: dec!(1000),
            yield_to_maturity: dec!(5.5),
        }
    }

    #[test]
    fn test_rating_order_and_investment_grade() {
        assert!(CreditRating::AAA < CreditRating::BBBMinus);
        assert!(CreditRating::BBBMinus.is_investment_grade());
        assert!(!CreditRating::BBPlus.is_investment_grade());
        assert!(!CreditRating::NotRated.is_investment_grade());
    }

    #[test]
    fn test_rating_parse_roundtrip_names() {
        for r in CreditRating::ALL {
            assert_eq!(r.as_str().parse::<CreditRating>().unwrap(), r);
        }
        assert!("D".parse::<CreditRating>().is_err());
    }

    #[test]
    fn test_unknown_rating_deserializes_as_not_rated() {
        let r: CreditRating = serde_json::from_str("\"CCC-\"").unwrap();
        assert_eq!(r, CreditRating::NotRated);
    }

    #[test]
    fn test_sector_parse_is_strict() {
        assert_eq!(
            "financial services".parse::<Sector>().unwrap(),
            Sector::FinancialServices
        );
        assert!("Shipping".parse::<Sector>().is_err());
    }

    #[test]
    fn test_unknown_sector_deserializes_as_other() {
        let s: Sector = serde_json::from_str("\"Shipping\"").unwrap();
        assert_eq!(s, Sector::Other);
        assert_eq!(serde_json::to_value(s).unwrap(), "Other");
    }

    #[test]
    fn test_terms_wire_shape_is_camel_case() {
        let json = serde_json::to_value(terms()).unwrap();
        assert_eq!(json["type"], "Corporate");
        assert_eq!(json["sector"], "Energy");
        assert_eq!(json["rating"], "BBB");
        assert!(json.get("couponRate").is_some());
        assert!(json.get("yieldToMaturity").is_some());
        assert!(json.get("maturityYears").is_some());
    }

    #[test]
    fn test_with_yield_recomputes_metrics() {
        let bond = Bond::from_terms(terms()).unwrap();
        let repriced = bond.with_yield(dec!(6.5)).unwrap();
        assert!(repriced.market_price() < bond.market_price());
        assert_ne!(repriced.metrics.duration, bond.metrics.duration);
        assert_eq!(repriced.terms.coupon_rate, bond.terms.coupon_rate);
    }

    #[test]
    fn test_bond_serializes_flat() {
        let bond = Bond::from_terms(terms()).unwrap();
        let json = serde_json::to_value(&bond).unwrap();
        assert!(json.get("marketPrice").is_some());
        assert!(json.get("issuer").is_some());
        assert_eq!(json["cashflows"].as_array().unwrap().len(), 7);
        let back: Bond = serde_json::from_value(json).unwrap();
        assert_eq!(back.id(), 1);
    }
}
