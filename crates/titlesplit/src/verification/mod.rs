//! Manual verification records gathered after a viewing and title search,
//! plus the rules that turn each verified fact into a deal impact.

mod impact;
mod repository;

pub use impact::{
    calculate_total_impact, Impact, ImpactAssessor, ImpactCategory, ImpactClass, TotalImpact,
};
pub use repository::{RepositoryError, VerificationRepository};

use crate::domain::{PropertyId, TenureCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleClass {
    Absolute,
    Qualified,
    Possessory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UseClass {
    C3,
    C4,
    #[serde(rename = "sui_generis")]
    SuiGeneris,
}

impl UseClass {
    pub const fn label(self) -> &'static str {
        match self {
            Self::C3 => "C3 (Dwellinghouse)",
            Self::C4 => "C4 (Small HMO)",
            Self::SuiGeneris => "Sui Generis (large HMO)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentLikelihood {
    Likely,
    Uncertain,
    Unlikely,
    Refused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachRisk {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeType {
    LegalCharge,
    EquitableCharge,
    ChargingOrder,
    Restriction,
}

impl ChargeType {
    pub const fn code(self) -> &'static str {
        match self {
            Self::LegalCharge => "legal_charge",
            Self::EquitableCharge => "equitable_charge",
            Self::ChargingOrder => "charging_order",
            Self::Restriction => "restriction",
        }
    }
}

/// Register entries read from the official copy of the title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleVerification {
    pub title_number: Option<String>,
    pub title_class: Option<TitleClass>,
    pub tenure_confirmed: Option<TenureCode>,
    pub is_single_title: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingCharge {
    pub lender_name: String,
    pub charge_type: ChargeType,
    #[serde(default)]
    pub is_all_monies_charge: Option<bool>,
    #[serde(default)]
    pub has_consent_restriction: Option<bool>,
    #[serde(default)]
    pub consent_likelihood: Option<ConsentLikelihood>,
    #[serde(default)]
    pub consent_fee_quoted: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictiveCovenant {
    pub summary: String,
    #[serde(default)]
    pub affects_title_split: Option<bool>,
    #[serde(default)]
    pub breach_risk: Option<BreachRisk>,
    #[serde(default)]
    pub insurance_cost_estimate: Option<i64>,
}

impl RestrictiveCovenant {
    pub fn blocks_split(&self) -> bool {
        self.affects_title_split == Some(true) && self.breach_risk == Some(BreachRisk::High)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleInputs {
    pub verification: Option<TitleVerification>,
    pub charges: Vec<ExistingCharge>,
    pub covenants: Vec<RestrictiveCovenant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningStatus {
    pub current_use_class: Option<UseClass>,
    pub original_conversion_consented: Option<bool>,
    pub in_article_4_area: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HmoLicensing {
    pub requires_mandatory_licence: Option<bool>,
    pub licence_held: Option<bool>,
    pub licence_number: Option<String>,
    pub fire_safety_compliant: Option<bool>,
}

impl HmoLicensing {
    /// Mandatory licensing applies and no licence is held.
    pub fn unlicensed(&self) -> bool {
        self.requires_mandatory_licence == Some(true) && self.licence_held != Some(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningInputs {
    pub planning_status: Option<PlanningStatus>,
    pub hmo_licensing: Option<HmoLicensing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitVerification {
    pub unit_identifier: String,
    #[serde(default)]
    pub is_self_contained: Option<bool>,
    #[serde(default)]
    pub bedrooms: Option<u8>,
    #[serde(default)]
    pub floor_area_sqft: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalVerification {
    pub units: Vec<UnitVerification>,
    pub structural_concerns: Vec<String>,
}

impl PhysicalVerification {
    pub fn non_self_contained(&self) -> Vec<&UnitVerification> {
        self.units
            .iter()
            .filter(|unit| unit.is_self_contained == Some(false))
            .collect()
    }

    /// At least one unit was checked and none failed.
    pub fn all_self_contained(&self) -> bool {
        self.units.iter().any(|unit| unit.is_self_contained.is_some())
            && self.units.iter().all(|unit| unit.is_self_contained != Some(false))
    }
}

/// Everything verified by hand for one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub property_id: PropertyId,
    #[serde(default)]
    pub title: TitleInputs,
    #[serde(default)]
    pub planning: PlanningInputs,
    #[serde(default)]
    pub physical: Option<PhysicalVerification>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub green_flags: Vec<String>,
}

impl VerificationRecord {
    pub fn new(property_id: PropertyId) -> Self {
        Self {
            property_id,
            title: TitleInputs::default(),
            planning: PlanningInputs::default(),
            physical: None,
            red_flags: Vec::new(),
            green_flags: Vec::new(),
        }
    }

    /// Title register, planning status and a physical inspection are all on file.
    pub fn is_fully_verified(&self) -> bool {
        self.title.verification.is_some()
            && self.planning.planning_status.is_some()
            && self.physical.is_some()
    }

    /// Share of the four verification sections that have been filled in.
    pub fn completion_percent(&self) -> f64 {
        let sections = [
            self.title.verification.is_some(),
            self.planning.planning_status.is_some(),
            self.planning.hmo_licensing.is_some(),
            self.physical.is_some(),
        ];
        let done = sections.iter().filter(|present| **present).count();
        done as f64 / sections.len() as f64 * 100.0
    }
}
