//! Deterministic synthetic bond universe.
//!
//! The universe is a pure function of `(seed, count)`. Per bond the random
//! stream is consumed in a fixed order:
//!
//! 1. issuer (governments) or sector, name prefix and rating (corporates)
//! 2. maturity
//! 3. coupon offset
//!
//! Odd ids are Government, even ids Corporate. Yields are not random: they
//! come from [`indicative_yield_pct`].

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::types::{Bond, BondTerms, BondType, CreditRating, Sector};
use crate::types::{BondId, Money, Percent};
use crate::BondRiskResult;

/// Face value of every generated bond.
pub const FACE_VALUE: Money = dec!(1000);

/// Maturities (whole years) a generated bond can have.
pub const MATURITY_CHOICES: [u32; 9] = [1, 2, 3, 5, 7, 10, 15, 20, 30];

const SOVEREIGNS: [(&str, CreditRating); 8] = [
    ("U.S. Treasury", CreditRating::AAPlus),
    ("German Bund", CreditRating::AAA),
    ("UK Gilt", CreditRating::AA),
    ("French OAT", CreditRating::AAMinus),
    ("Japanese JGB", CreditRating::APlus),
    ("Government of Canada", CreditRating::AAA),
    ("Australian Commonwealth", CreditRating::AAA),
    ("Italian BTP", CreditRating::BBB),
];

const NAME_PREFIXES: [&str; 12] = [
    "Apex",
    "Summit",
    "Harbor",
    "Northwind",
    "Crescent",
    "Ironclad",
    "Bluewater",
    "Evergreen",
    "Pinnacle",
    "Redwood",
    "Silverline",
    "Keystone",
];

/// Corporate rating draw: AAA..B+ with relative weights.
const CORPORATE_RATING_WEIGHTS: [(CreditRating, u32); 13] = [
    (CreditRating::AAA, 2),
    (CreditRating::AAPlus, 3),
    (CreditRating::AA, 4),
    (CreditRating::AAMinus, 5),
    (CreditRating::APlus, 8),
    (CreditRating::A, 10),
    (CreditRating::AMinus, 10),
    (CreditRating::BBBPlus, 12),
    (CreditRating::BBB, 12),
    (CreditRating::BBBMinus, 10),
    (CreditRating::BBPlus, 8),
    (CreditRating::BB, 8),
    (CreditRating::BPlus, 8),
];

/// Generate `count` bonds from `seed`, ids `1..=count`.
pub fn generate(seed: u64, count: usize) -> BondRiskResult<Vec<Bond>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let rating_dist = WeightedIndex::new(CORPORATE_RATING_WEIGHTS.iter().map(|(_, w)| *w))
        .map_err(|e| crate::BondRiskError::invalid("rating_weights", e.to_string()))?;

    let mut bonds = Vec::with_capacity(count);
    for idx in 0..count {
        let id = (idx + 1) as BondId;
        let terms = draw_terms(&mut rng, &rating_dist, id);
        bonds.push(Bond::from_terms(terms)?);
    }

    debug!(seed, count, "generated bond universe");
    Ok(bonds)
}

/// Generate only the terms (no pricing). Same stream as [`generate`].
pub fn generate_terms(seed: u64, count: usize) -> BondRiskResult<Vec<BondTerms>> {
    Ok(generate(seed, count)?.into_iter().map(|b| b.terms).collect())
}

fn draw_terms(rng: &mut StdRng, rating_dist: &WeightedIndex<u32>, id: BondId) -> BondTerms {
    let (issuer, bond_type, sector, rating) = if id % 2 == 1 {
        let (name, rating) = SOVEREIGNS[rng.gen_range(0..SOVEREIGNS.len())];
        (
            name.to_string(),
            BondType::Government,
            Sector::Government,
            rating,
        )
    } else {
        let sector = Sector::CORPORATE[rng.gen_range(0..Sector::CORPORATE.len())];
        let prefix = NAME_PREFIXES[rng.gen_range(0..NAME_PREFIXES.len())];
        let rating = CORPORATE_RATING_WEIGHTS[rating_dist.sample(rng)].0;
        (
            format!("{prefix} {}", issuer_suffix(sector)),
            BondType::Corporate,
            sector,
            rating,
        )
    };

    let maturity_years = MATURITY_CHOICES[rng.gen_range(0..MATURITY_CHOICES.len())];
    let yield_to_maturity = indicative_yield_pct(bond_type, sector, rating, maturity_years);

    // Coupon sits near the yield so prices stay in a realistic band.
    let offset: i64 = rng.gen_range(-4..=4);
    let coupon_rate =
        ((yield_to_maturity * dec!(8)).round() / dec!(8) + Decimal::from(offset) * dec!(0.25))
            .max(dec!(0.5));

    BondTerms {
        id,
        issuer,
        bond_type,
        sector,
        rating,
        coupon_rate,
        maturity_years,
        face_value: FACE_VALUE,
        yield_to_maturity,
    }
}

fn issuer_suffix(sector: Sector) -> &'static str {
    match sector {
        Sector::Government => "Treasury",
        Sector::Banking => "Bank",
        Sector::Technology => "Technologies",
        Sector::Healthcare => "Health",
        Sector::Energy => "Energy",
        Sector::Utilities => "Power & Light",
        Sector::Telecom => "Communications",
        Sector::Industrials => "Industries",
        Sector::Consumer => "Brands",
        Sector::FinancialServices => "Capital",
        Sector::Other => "Group",
    }
}

/// Deterministic yield (percent) for a bond's characteristics:
///
/// `curve(m) + spread(rating) [+ sector premium for corporates]`, where the
/// curve is 2.50% + 12bp per year out to 10y and 3bp per year beyond.
/// Governments take the rating spread less 5bp, so AAA sovereigns sit on the
/// curve. Rounded to 2 dp.
pub fn indicative_yield_pct(
    bond_type: BondType,
    sector: Sector,
    rating: CreditRating,
    maturity_years: u32,
) -> Percent {
    let m = Decimal::from(maturity_years);
    let ten = dec!(10);
    let curve = dec!(2.50) + dec!(0.12) * m.min(ten) + dec!(0.03) * (m - ten).max(Decimal::ZERO);

    let spread = rating_spread_pct(rating);
    let credit = match bond_type {
        BondType::Government => (spread - dec!(0.05)).max(Decimal::ZERO),
        BondType::Corporate => spread + sector_premium_pct(sector),
    };

    (curve + credit).round_dp(2)
}

fn rating_spread_pct(rating: CreditRating) -> Percent {
    match rating {
        CreditRating::AAA => dec!(0.05),
        CreditRating::AAPlus => dec!(0.15),
        CreditRating::AA => dec!(0.25),
        CreditRating::AAMinus => dec!(0.35),
        CreditRating::APlus => dec!(0.55),
        CreditRating::A => dec!(0.70),
        CreditRating::AMinus => dec!(0.85),
        CreditRating::BBBPlus => dec!(1.10),
        CreditRating::BBB => dec!(1.35),
        CreditRating::BBBMinus => dec!(1.70),
        CreditRating::BBPlus => dec!(2.40),
        CreditRating::BB => dec!(3.10),
        CreditRating::BPlus => dec!(4.25),
        CreditRating::B => dec!(5.25),
        CreditRating::BMinus => dec!(6.25),
        CreditRating::CCC => dec!(9.00),
        CreditRating::NotRated => dec!(2.00),
    }
}

fn sector_premium_pct(sector: Sector) -> Percent {
    match sector {
        Sector::Government => Decimal::ZERO,
        Sector::Banking => dec!(0.20),
        Sector::Technology => dec!(0.15),
        Sector::Healthcare => dec!(0.10),
        Sector::Energy => dec!(0.35),
        Sector::Utilities => dec!(0.05),
        Sector::Telecom => dec!(0.25),
        Sector::Industrials => dec!(0.15),
        Sector::Consumer => dec!(0.10),
        Sector::FinancialServices => dec!(0.20),
        Sector::Other => dec!(0.25),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_universe() {
        let a = generate(42, 50).unwrap();
        let b = generate(42, 50).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_differs() {
        let a = generate_terms(42, 50).unwrap();
        let b = generate_terms(7, 50).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_ids_are_sequential_from_one() {
        let bonds = generate(1, 12).unwrap();
        let ids: Vec<u32> = bonds.iter().map(|b| b.id()).collect();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_count_is_empty() {
        assert!(generate(42, 0).unwrap().is_empty());
    }

    #[test]
    fn test_half_government_half_corporate() {
        let bonds = generate(42, 50).unwrap();
        let gov = bonds
            .iter()
            .filter(|b| b.bond_type() == BondType::Government)
            .count();
        assert_eq!(gov, 25);

        let odd = generate(42, 5).unwrap();
        let gov_odd = odd
            .iter()
            .filter(|b| b.bond_type() == BondType::Government)
            .count();
        assert_eq!(gov_odd, 3);
    }

    #[test]
    fn test_government_bonds_are_government_sector() {
        for b in generate(9, 40).unwrap() {
            match b.bond_type() {
                BondType::Government => assert_eq!(b.terms.sector, Sector::Government),
                BondType::Corporate => assert_ne!(b.terms.sector, Sector::Government),
            }
        }
    }

    #[test]
    fn test_terms_within_documented_ranges() {
        for b in generate(42, 200).unwrap() {
            assert!(MATURITY_CHOICES.contains(&b.maturity_years()));
            assert_eq!(b.terms.face_value, FACE_VALUE);
            assert!(b.terms.coupon_rate >= dec!(0.5));
            assert!(b.terms.yield_to_maturity > Decimal::ZERO);
            assert_ne!(b.rating(), CreditRating::NotRated);
        }
    }

    #[test]
    fn test_prefix_of_longer_universe_matches() {
        // The stream is consumed bond by bond, so a longer universe extends a shorter one.
        let short = generate_terms(42, 10).unwrap();
        let long = generate_terms(42, 20).unwrap();
        assert_eq!(short[..], long[..10]);
    }

    #[test]
    fn test_indicative_yield_monotone_in_rating_and_maturity() {
        let y_aaa = indicative_yield_pct(BondType::Corporate, Sector::Utilities, CreditRating::AAA, 5);
        let y_bb = indicative_yield_pct(BondType::Corporate, Sector::Utilities, CreditRating::BB, 5);
        assert!(y_bb > y_aaa);

        let short = indicative_yield_pct(BondType::Government, Sector::Government, CreditRating::AAA, 2);
        let long = indicative_yield_pct(BondType::Government, Sector::Government, CreditRating::AAA, 30);
        assert!(long > short);
    }

    #[test]
    fn test_aaa_sovereign_sits_on_curve() {
        // 2.50 + 0.12 * 10
        let y = indicative_yield_pct(BondType::Government, Sector::Government, CreditRating::AAA, 10);
        assert_eq!(y, dec!(3.70));
    }
}
