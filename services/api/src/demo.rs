use crate::infra::InMemoryVerificationRepository;
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use titlesplit::appraisal::{Appraisal, AppraisalRequest, AppraisalService};
use titlesplit::config::EngineConfig;
use titlesplit::costs::CostScenario;
use titlesplit::domain::{
    ComparableSale, EnergyRating, EpcRecord, ListingSnapshot, PropertyId, PropertyType, Tenure,
    TenureCode, UnitSpec,
};
use titlesplit::error::AppError;
use titlesplit::evidence::{ComparableImporter, EpcImporter};
use titlesplit::scoring::ListingAssessment;
use titlesplit::valuation::ValuationEvidence;
use titlesplit::verification::{
    ChargeType, ConsentLikelihood, ExistingCharge, HmoLicensing, PhysicalVerification,
    PlanningInputs, PlanningStatus, TitleClass, TitleInputs, TitleVerification, UnitVerification,
    UseClass, VerificationRecord, VerificationRepository,
};

#[derive(Args, Debug)]
pub(crate) struct AppraiseArgs {
    /// JSON appraisal request (listing, units, evidence, scenario, as_of)
    #[arg(long)]
    pub(crate) request: PathBuf,
    /// Optional sold-prices CSV appended to the request evidence
    #[arg(long)]
    pub(crate) comparables: Option<PathBuf>,
    /// Optional EPC register CSV appended to the request evidence
    #[arg(long)]
    pub(crate) epcs: Option<PathBuf>,
    /// Optional JSON verification record stored before appraising
    #[arg(long)]
    pub(crate) verification: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Valuation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

pub(crate) fn run_appraise(args: AppraiseArgs) -> Result<(), AppError> {
    let AppraiseArgs {
        request,
        comparables,
        epcs,
        verification,
    } = args;

    let raw = std::fs::read_to_string(&request)?;
    let mut request: AppraisalRequest = serde_json::from_str(&raw)?;

    if let Some(path) = comparables {
        request
            .evidence
            .comparables
            .extend(ComparableImporter::from_path(path)?);
    }
    if let Some(path) = epcs {
        request.evidence.epcs.extend(EpcImporter::from_path(path)?);
    }

    let repository = Arc::new(InMemoryVerificationRepository::default());
    if let Some(path) = verification {
        let raw = std::fs::read_to_string(&path)?;
        let record: VerificationRecord = serde_json::from_str(&raw)?;
        repository
            .save(record)
            .map_err(|err| AppError::Appraisal(err.into()))?;
    }

    let service = AppraisalService::new(repository, Arc::new(EngineConfig::default()));
    let appraisal = service.appraise(request)?;
    println!("{}", serde_json::to_string_pretty(&appraisal)?);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let repository = Arc::new(InMemoryVerificationRepository::default());
    let service = AppraisalService::new(repository, Arc::new(EngineConfig::default()));

    println!("Title split appraisal demo (valued {as_of})");

    let mut request = demo_request(as_of);
    println!("\nStage 1: listing data only");
    render_appraisal(&service.appraise(request.clone())?);

    request.units = demo_units();
    request.evidence = demo_evidence(as_of);
    println!("\nStage 2: enriched with sold prices and EPCs");
    render_appraisal(&service.appraise(request.clone())?);

    let outcome = service.record_verification(demo_verification())?;
    println!(
        "\nVerification recorded: {:.0}% complete, {} impacts, total score {}",
        outcome.completion_percent,
        outcome.summary.impact_count,
        outcome.summary.total_score
    );
    println!("\nStage 3: verified");
    render_appraisal(&service.appraise(request)?);

    Ok(())
}

fn render_appraisal(appraisal: &Appraisal) {
    let recommendation = &appraisal.recommendation;
    println!(
        "- {:?}: {} (confidence {:.0}%)",
        recommendation.level,
        recommendation.headline,
        recommendation.confidence * 100.0
    );
    println!(
        "  Screening score {} | opportunity {} | tier {:?}",
        appraisal.screening.score, appraisal.score.opportunity_score, appraisal.score.tier
    );

    if let Some(report) = &appraisal.valuation {
        println!(
            "  GDV {} ({} to {}, {:?}) across {} units",
            report.total_gdv,
            report.gdv_range_low,
            report.gdv_range_high,
            report.gdv_confidence,
            report.total_units
        );
        println!(
            "  Gross uplift {} ({:.1}%) | split costs {} | net uplift {}",
            report.gross_uplift,
            report.gross_uplift_percent,
            report.title_split_costs,
            report.net_uplift
        );
        for unit in &report.unit_valuations {
            println!(
                "    - {}: {} via {} ({:.0} sqft)",
                unit.unit_id, unit.estimated_value, unit.method, unit.floor_area_sqft
            );
        }
    }
    if let Some(analysis) = &appraisal.cost_benefit {
        println!(
            "  Cost/benefit {:?}: {}",
            analysis.verdict, analysis.rationale
        );
    }

    for factor in &recommendation.positive_factors {
        println!("  + {factor}");
    }
    for factor in &recommendation.negative_factors {
        println!("  - {factor}");
    }
    for blocker in &recommendation.hard_blockers {
        println!("  ! {blocker}");
    }
    if !recommendation.required_actions.is_empty() {
        println!("  Next: {}", recommendation.required_actions.join("; "));
    }
}

fn demo_request(as_of: NaiveDate) -> AppraisalRequest {
    AppraisalRequest {
        listing: ListingSnapshot {
            property_id: PropertyId("rm-southport-pr9".to_string()),
            postcode: "PR9 0NP".to_string(),
            asking_price: 319_500,
            estimated_units: Some(6),
            tenure: Tenure::Freehold,
            tenure_confidence: 0.9,
            unit_confidence: 0.85,
            refurb_indicators: vec!["modernisation".to_string()],
            description: "Freehold block of six self-contained flats, sold as one title."
                .to_string(),
        },
        units: Vec::new(),
        evidence: ValuationEvidence::default(),
        assessment: ListingAssessment {
            single_title_likely: true,
            self_contained: Some(true),
            refurb_needed: true,
            ..ListingAssessment::default()
        },
        monthly_rent_per_unit: Some(550),
        scenario: CostScenario::Typical,
        as_of,
    }
}

fn demo_units() -> Vec<UnitSpec> {
    (1..=6)
        .map(|index| UnitSpec {
            id: format!("Flat {index}"),
            bedrooms: Some(if index <= 2 { 2 } else { 1 }),
            floor_area_sqft: None,
            energy_rating: None,
        })
        .collect()
}

fn demo_evidence(as_of: NaiveDate) -> ValuationEvidence {
    let sales = [
        ("Flat 1, 22 Leyland Road", 75_000, 40),
        ("Flat 3, 22 Leyland Road", 82_500, 95),
        ("Flat 2, 9 Albert Road", 90_000, 150),
        ("Flat 4, 31 Church Street", 78_000, 210),
        ("Flat 1, 5 Hoghton Street", 86_000, 300),
    ];
    let comparables = sales
        .iter()
        .map(|(address, price, days_ago)| ComparableSale {
            address: (*address).to_string(),
            postcode: "PR9 0TE".to_string(),
            price: *price,
            sale_date: as_of - chrono::Duration::days(*days_ago),
            property_type: PropertyType::Flat,
            new_build: false,
            tenure: TenureCode::Leasehold,
        })
        .collect();

    let certificates = [
        ("Flat 1, 22 Leyland Road", EnergyRating::C, 52.0),
        ("Flat 3, 22 Leyland Road", EnergyRating::D, 48.0),
        ("Flat 2, 9 Albert Road", EnergyRating::C, 61.0),
        ("Flat 4, 31 Church Street", EnergyRating::D, 45.0),
    ];
    let epcs = certificates
        .iter()
        .map(|(address, rating, area)| EpcRecord {
            address: (*address).to_string(),
            postcode: "PR9 0TE".to_string(),
            rating: Some(*rating),
            floor_area_sqm: Some(*area),
        })
        .collect();

    ValuationEvidence { comparables, epcs }
}

fn demo_verification() -> VerificationRecord {
    let mut record = VerificationRecord::new(PropertyId("rm-southport-pr9".to_string()));
    record.title = TitleInputs {
        verification: Some(TitleVerification {
            title_number: Some("MS123456".to_string()),
            title_class: Some(TitleClass::Absolute),
            tenure_confirmed: Some(TenureCode::Freehold),
            is_single_title: Some(true),
            notes: None,
        }),
        charges: vec![ExistingCharge {
            lender_name: "Northern Building Society".to_string(),
            charge_type: ChargeType::LegalCharge,
            is_all_monies_charge: Some(false),
            has_consent_restriction: Some(true),
            consent_likelihood: Some(ConsentLikelihood::Likely),
            consent_fee_quoted: Some(750),
        }],
        covenants: Vec::new(),
    };
    record.planning = PlanningInputs {
        planning_status: Some(PlanningStatus {
            current_use_class: Some(UseClass::C3),
            original_conversion_consented: Some(true),
            in_article_4_area: Some(false),
        }),
        hmo_licensing: Some(HmoLicensing {
            requires_mandatory_licence: Some(false),
            ..HmoLicensing::default()
        }),
    };
    record.physical = Some(PhysicalVerification {
        units: (1..=6)
            .map(|index| UnitVerification {
                unit_identifier: format!("Flat {index}"),
                is_self_contained: Some(true),
                bedrooms: Some(if index <= 2 { 2 } else { 1 }),
                floor_area_sqft: None,
            })
            .collect(),
        structural_concerns: Vec::new(),
    });
    record
        .green_flags
        .push("Separate gas and electric meters".to_string());
    record
}
