use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use titlesplit::config::EngineConfig;
use titlesplit::domain::{ComparableSale, EpcRecord, PropertyType, TenureCode, UnitSpec};
use titlesplit::validation::{
    sanity_check_gdv, validate_unit_value_against_rent, SanityCheck, SanityInput, SanityPolicy,
    YieldBand, YieldOutcome,
};
use titlesplit::valuation::{
    BlockValuationRequest, ConfidenceTier, FloorAreaSource, ValuationEngine, ValuationEvidence,
};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid as_of date")
}

fn sale(address: &str, price: i64, property_type: PropertyType, days_ago: i64) -> ComparableSale {
    ComparableSale {
        address: address.to_string(),
        postcode: "PR9 0TE".to_string(),
        price,
        sale_date: as_of() - Duration::days(days_ago),
        property_type,
        new_build: false,
        tenure: TenureCode::Leasehold,
    }
}

fn flat_sales(prices: &[i64]) -> Vec<ComparableSale> {
    prices
        .iter()
        .enumerate()
        .map(|(index, price)| {
            sale(
                &format!("Flat {}, 12 Promenade", index + 1),
                *price,
                PropertyType::Flat,
                30 + index as i64 * 20,
            )
        })
        .collect()
}

fn house_sales(prices: &[i64]) -> Vec<ComparableSale> {
    prices
        .iter()
        .enumerate()
        .map(|(index, price)| {
            sale(
                &format!("{} Cambridge Road", index + 10),
                *price,
                PropertyType::Detached,
                45,
            )
        })
        .collect()
}

fn units(count: usize) -> Vec<UnitSpec> {
    (1..=count)
        .map(|index| UnitSpec {
            id: format!("Flat {index}"),
            bedrooms: Some(1),
            floor_area_sqft: None,
            energy_rating: None,
        })
        .collect()
}

fn engine() -> ValuationEngine {
    ValuationEngine::new(Arc::new(EngineConfig::default()))
}

#[test]
fn yield_guard_catches_inflated_unit_value() {
    let check = validate_unit_value_against_rent(345_000, 436, YieldBand::default());

    assert!(!check.valid);
    assert_eq!(check.outcome, YieldOutcome::ValueTooHigh);
    let corrected = check.corrected_value.expect("corrected value");
    assert!((80_000..=110_000).contains(&corrected), "corrected {corrected}");
}

#[test]
fn house_comparables_fail_block_sanity_check() {
    let comparables = house_sales(&[320_000, 330_000, 335_000, 342_000, 350_000]);
    let input = SanityInput {
        total_gdv: 6 * 335_000,
        asking_price: 319_500,
        num_units: 6,
        comparables: &comparables,
        monthly_rent_per_unit: None,
    };

    let report = sanity_check_gdv(&input, &SanityPolicy::default());

    assert!(!report.passed);
    assert!(report.has_issue(SanityCheck::UnitExceedsBlockPrice));
}

#[test]
fn flat_comparables_pass_block_sanity_check() {
    let comparables = flat_sales(&[75_000, 78_000, 82_000, 85_000, 90_000]);
    let input = SanityInput {
        total_gdv: 510_000,
        asking_price: 319_500,
        num_units: 6,
        comparables: &comparables,
        monthly_rent_per_unit: None,
    };

    let report = sanity_check_gdv(&input, &SanityPolicy::default());

    assert!(report.passed);
    assert!(report.issues.is_empty());
}

#[test]
fn every_unit_value_sits_inside_its_range() {
    let engine = engine();
    let evidence_sets = [
        ValuationEvidence::default(),
        ValuationEvidence {
            comparables: flat_sales(&[80_000]),
            epcs: Vec::new(),
        },
        ValuationEvidence {
            comparables: flat_sales(&[72_000, 79_000, 84_000, 88_000, 91_000, 95_000]),
            epcs: vec![EpcRecord {
                address: "Flat 1, 12 Promenade".to_string(),
                postcode: "PR9 0TE".to_string(),
                rating: None,
                floor_area_sqm: Some(50.0),
            }],
        },
    ];

    for (postcode, evidence) in ["PR9 0NP", "ZE1 0AA"]
        .into_iter()
        .flat_map(|postcode| evidence_sets.iter().map(move |evidence| (postcode, evidence)))
    {
        let report = engine.value_block(&BlockValuationRequest {
            postcode: postcode.to_string(),
            asking_price: 300_000,
            units: units(4),
            evidence: evidence.clone(),
            title_split_costs: 0,
            monthly_rent_per_unit: Some(500),
            as_of: as_of(),
        });

        for unit in &report.unit_valuations {
            assert!(
                unit.value_range_low <= unit.estimated_value
                    && unit.estimated_value <= unit.value_range_high,
                "{postcode}: {} out of range",
                unit.unit_id
            );
        }
        assert!(report.gdv_range_low <= report.total_gdv);
        assert!(report.total_gdv <= report.gdv_range_high);
    }
}

#[test]
fn ten_comparables_with_measured_area_are_high_confidence() {
    let evidence = ValuationEvidence {
        comparables: flat_sales(&[
            76_000, 78_000, 80_000, 81_000, 82_000, 84_000, 85_000, 87_000, 88_000, 90_000,
        ]),
        epcs: Vec::new(),
    };
    let unit = UnitSpec {
        id: "Flat 1".to_string(),
        bedrooms: Some(2),
        floor_area_sqft: Some(620.0),
        energy_rating: None,
    };

    let valuation = engine().value_unit(&unit, 0, "PR9 0NP", &evidence, as_of());

    assert_eq!(valuation.comparable_count, 10);
    assert_ne!(valuation.floor_area_source, FloorAreaSource::Typical);
    assert_eq!(valuation.confidence, ConfidenceTier::High);
}

#[test]
fn house_sales_are_not_counted_as_flat_evidence() {
    let mut comparables = house_sales(&[320_000, 335_000, 350_000]);
    comparables.extend(flat_sales(&[80_000, 84_000]));
    let evidence = ValuationEvidence {
        comparables,
        epcs: Vec::new(),
    };

    let valuation = engine().value_unit(&units(1)[0], 0, "PR9 0NP", &evidence, as_of());

    assert_eq!(valuation.comparable_count, 2);
    assert!(valuation.estimated_value < 150_000);
}

#[test]
fn unpriced_comparables_are_ignored() {
    let evidence = ValuationEvidence {
        comparables: flat_sales(&[-50_000, -50_000, -50_000, 0]),
        epcs: Vec::new(),
    };

    let valuation = engine().value_unit(&units(1)[0], 0, "SW1A 1AA", &evidence, as_of());

    assert_eq!(valuation.comparable_count, 0);
    assert_eq!(valuation.estimated_value, 0);
    assert!(valuation.value_range_low <= valuation.estimated_value);
    assert!(valuation.estimated_value <= valuation.value_range_high);

    let mut mixed = flat_sales(&[-50_000, -40_000]);
    mixed.extend(flat_sales(&[82_000, 86_000]));
    let evidence = ValuationEvidence {
        comparables: mixed,
        epcs: Vec::new(),
    };

    let valuation = engine().value_unit(&units(1)[0], 0, "SW1A 1AA", &evidence, as_of());

    assert_eq!(valuation.comparable_count, 2);
    assert!(valuation.estimated_value >= 82_000);
    assert!(valuation.value_range_low <= valuation.estimated_value);
    assert!(valuation.estimated_value <= valuation.value_range_high);
}

#[test]
fn gdv_below_asking_margin_is_scaled_up_to_the_floor() {
    let asking_price = 400_000;
    let report = engine().value_block(&BlockValuationRequest {
        postcode: "SW1A 1AA".to_string(),
        asking_price,
        units: units(4),
        evidence: ValuationEvidence {
            comparables: flat_sales(&[78_000, 80_000, 82_000]),
            epcs: Vec::new(),
        },
        title_split_costs: 0,
        monthly_rent_per_unit: None,
        as_of: as_of(),
    });

    let floor_gdv = (asking_price as f64 * 1.10).ceil() as i64;
    let adjustment = report.floor_adjustment.as_ref().expect("floor applied");
    assert!(adjustment.original_gdv < floor_gdv);
    assert_eq!(adjustment.floor_gdv, floor_gdv);
    assert!(adjustment.scale_factor > 1.0);
    assert_eq!(adjustment.adjusted_gdv, report.total_gdv);
    assert!(report.total_gdv >= floor_gdv);
    assert!(report
        .limitations
        .iter()
        .any(|note| note.starts_with("GDV floor applied")));

    for unit in &report.unit_valuations {
        assert!(unit.value_range_low <= unit.estimated_value);
        assert!(unit.estimated_value <= unit.value_range_high);
    }
    assert!(report.gdv_range_low <= report.total_gdv);
    assert!(report.total_gdv <= report.gdv_range_high);
}

#[test]
fn zero_gdv_is_left_unscaled() {
    let report = engine().value_block(&BlockValuationRequest {
        postcode: "SW1A 1AA".to_string(),
        asking_price: 400_000,
        units: units(3),
        evidence: ValuationEvidence::default(),
        title_split_costs: 0,
        monthly_rent_per_unit: None,
        as_of: as_of(),
    });

    assert_eq!(report.total_gdv, 0);
    assert!(report.floor_adjustment.is_none());
    assert!(!report
        .limitations
        .iter()
        .any(|note| note.starts_with("GDV floor applied")));
}
