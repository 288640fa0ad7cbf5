use bond_risk_core::bonds::generator::{generate, generate_terms, MATURITY_CHOICES};
use bond_risk_core::fixed_income::pricing::price;
use bond_risk_core::{enrich_payload, Bond, BondTerms, BondType, CreditRating, Sector};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Generator
// ===========================================================================

#[test]
fn test_generation_is_reproducible() {
    let a = generate(42, 50).unwrap();
    let b = generate(42, 50).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_generated_universe_shape() {
    let bonds = generate(42, 50).unwrap();
    assert_eq!(bonds.len(), 50);
    for (i, b) in bonds.iter().enumerate() {
        assert_eq!(b.id(), i as u32 + 1);
        assert!(MATURITY_CHOICES.contains(&b.maturity_years()));
        assert_eq!(b.terms.face_value, dec!(1000));
        match b.bond_type() {
            BondType::Government => assert_eq!(b.terms.sector, Sector::Government),
            BondType::Corporate => assert_ne!(b.terms.sector, Sector::Government),
        }
        assert_ne!(b.rating(), CreditRating::NotRated);
    }
}

#[test]
fn test_cashflows_consistent_with_price() {
    for b in generate(42, 50).unwrap() {
        let sum: Decimal = b.metrics.cashflows.iter().map(|c| c.discounted).sum();
        let rel = ((sum - b.market_price()) / b.market_price()).abs();
        assert!(rel < dec!(0.000001), "bond {} rel err {}", b.id(), rel);

        let last = b.metrics.cashflows.len() - 1;
        for (i, cf) in b.metrics.cashflows.iter().enumerate() {
            assert_eq!(cf.total, cf.coupon + cf.principal);
            if i != last {
                assert_eq!(cf.principal, Decimal::ZERO);
            }
        }
        assert!(b.metrics.expected_loss >= Decimal::ZERO);
    }
}

#[test]
fn test_metrics_follow_terms() {
    let terms = generate_terms(3, 4).unwrap();
    let bond = Bond::from_terms(terms[1].clone()).unwrap();
    let higher = bond.with_yield(bond.terms.yield_to_maturity + dec!(1)).unwrap();
    assert!(higher.market_price() < bond.market_price());
    assert_eq!(higher.terms.id, bond.terms.id);
    assert_eq!(
        higher.metrics,
        Bond::from_terms(higher.terms.clone()).unwrap().metrics
    );
}

// ===========================================================================
// Pricing reference values
// ===========================================================================

#[test]
fn test_government_par_bond() {
    let terms = BondTerms {
        id: 1,
        issuer: "U.S. Treasury".into(),
        bond_type: BondType::Government,
        sector: Sector::Government,
        rating: CreditRating::AAPlus,
        coupon_rate: dec!(3),
        maturity_years: 10,
        face_value: dec!(1000),
        yield_to_maturity: dec!(3),
    };
    let out = price(&terms).unwrap();
    assert!((out.market_price - dec!(1000)).abs() < dec!(0.000001));
    assert_eq!(out.cr01, Decimal::ZERO);
}

#[test]
fn test_unknown_rating_in_payload_is_not_rated() {
    let payload = serde_json::json!({
        "bonds": [{
            "id": 7, "issuer": "Mystery Corp", "type": "Corporate", "sector": "Consumer",
            "rating": "CCC", "couponRate": 6, "maturityYears": 5,
            "faceValue": 1000, "yieldToMaturity": 6
        }]
    });
    let out = enrich_payload(&payload).unwrap();
    assert_eq!(out["bonds"][0]["rating"], "NR");
    // NR carries a 0.1% PD
    let pd: Decimal = serde_json::from_value(out["bonds"][0]["pd"].clone()).unwrap();
    assert_eq!(pd, dec!(0.1));
}
