use crate::domain::{ListingSnapshot, Tenure};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedFlagCategory {
    TitleComplexity,
    NotSingleTitle,
    MixedUseComplexity,
    LeaseholdIndicator,
    ConditionRisk,
}

impl RedFlagCategory {
    pub const fn code(self) -> &'static str {
        match self {
            Self::TitleComplexity => "title_complexity",
            Self::NotSingleTitle => "not_single_title",
            Self::MixedUseComplexity => "mixed_use_complexity",
            Self::LeaseholdIndicator => "leasehold_indicator",
            Self::ConditionRisk => "condition_risk",
        }
    }
}

/// Listing phrases worth flagging; `severe` phrases reject outright.
struct RedFlagPhrase {
    phrase: &'static str,
    category: RedFlagCategory,
    severe: bool,
}

const RED_FLAG_PHRASES: &[RedFlagPhrase] = &[
    RedFlagPhrase {
        phrase: "flying freehold",
        category: RedFlagCategory::TitleComplexity,
        severe: true,
    },
    RedFlagPhrase {
        phrase: "share of freehold",
        category: RedFlagCategory::NotSingleTitle,
        severe: false,
    },
    RedFlagPhrase {
        phrase: "commercial",
        category: RedFlagCategory::MixedUseComplexity,
        severe: false,
    },
    RedFlagPhrase {
        phrase: "retail",
        category: RedFlagCategory::MixedUseComplexity,
        severe: false,
    },
    RedFlagPhrase {
        phrase: "shop",
        category: RedFlagCategory::MixedUseComplexity,
        severe: false,
    },
    RedFlagPhrase {
        phrase: "ground rent",
        category: RedFlagCategory::LeaseholdIndicator,
        severe: false,
    },
    RedFlagPhrase {
        phrase: "service charge",
        category: RedFlagCategory::LeaseholdIndicator,
        severe: false,
    },
    RedFlagPhrase {
        phrase: "management company",
        category: RedFlagCategory::LeaseholdIndicator,
        severe: false,
    },
    RedFlagPhrase {
        phrase: "structural issues",
        category: RedFlagCategory::ConditionRisk,
        severe: false,
    },
    RedFlagPhrase {
        phrase: "subsidence",
        category: RedFlagCategory::ConditionRisk,
        severe: true,
    },
    RedFlagPhrase {
        phrase: "japanese knotweed",
        category: RedFlagCategory::ConditionRisk,
        severe: true,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreeningFlag {
    UnitCountUnclear,
    LargeBlock,
    ConfirmedLeasehold,
    ShareOfFreehold,
    PricePerUnitHigh,
    PricePerUnitSuspicious,
    RedFlag(RedFlagCategory),
    Warning(RedFlagCategory),
}

impl ScreeningFlag {
    pub fn code(self) -> String {
        match self {
            Self::UnitCountUnclear => "unit_count_unclear".to_string(),
            Self::LargeBlock => "large_block".to_string(),
            Self::ConfirmedLeasehold => "confirmed_leasehold".to_string(),
            Self::ShareOfFreehold => "share_of_freehold".to_string(),
            Self::PricePerUnitHigh => "price_per_unit_high".to_string(),
            Self::PricePerUnitSuspicious => "price_per_unit_suspicious".to_string(),
            Self::RedFlag(category) => format!("red_flag_{}", category.code()),
            Self::Warning(category) => format!("warning_{}", category.code()),
        }
    }
}

impl fmt::Display for ScreeningFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl Serialize for ScreeningFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreeningResult {
    pub passes: bool,
    pub rejections: Vec<ScreeningFlag>,
    pub warnings: Vec<ScreeningFlag>,
    pub score: u8,
}

/// Fast screen over listing data alone. Only confirmed leasehold and severe
/// description phrases reject; unclear data produces warnings.
pub fn initial_screen(listing: &ListingSnapshot) -> ScreeningResult {
    let mut rejections = Vec::new();
    let mut warnings = Vec::new();

    match listing.estimated_units {
        None | Some(0..=1) => warnings.push(ScreeningFlag::UnitCountUnclear),
        Some(11..) => warnings.push(ScreeningFlag::LargeBlock),
        Some(_) => {}
    }

    match listing.tenure {
        Tenure::Leasehold => rejections.push(ScreeningFlag::ConfirmedLeasehold),
        Tenure::ShareOfFreehold => warnings.push(ScreeningFlag::ShareOfFreehold),
        Tenure::Freehold | Tenure::Unknown => {}
    }

    if let Some(price_per_unit) = listing.price_per_unit() {
        if price_per_unit > 200_000 {
            warnings.push(ScreeningFlag::PricePerUnitHigh);
        } else if price_per_unit < 20_000 {
            warnings.push(ScreeningFlag::PricePerUnitSuspicious);
        }
    }

    let description = listing.description.to_lowercase();
    for entry in RED_FLAG_PHRASES {
        if description.contains(entry.phrase) {
            if entry.severe {
                rejections.push(ScreeningFlag::RedFlag(entry.category));
            } else {
                warnings.push(ScreeningFlag::Warning(entry.category));
            }
        }
    }

    let score = quick_score(listing, &rejections, &warnings);

    ScreeningResult {
        passes: rejections.is_empty(),
        rejections,
        warnings,
        score,
    }
}

/// Screens a batch and orders it best first.
pub fn screen_batch(listings: &[ListingSnapshot]) -> Vec<(&ListingSnapshot, ScreeningResult)> {
    let mut results: Vec<_> = listings
        .iter()
        .map(|listing| (listing, initial_screen(listing)))
        .collect();
    results.sort_by(|a, b| b.1.score.cmp(&a.1.score));
    results
}

fn quick_score(
    listing: &ListingSnapshot,
    rejections: &[ScreeningFlag],
    warnings: &[ScreeningFlag],
) -> u8 {
    if !rejections.is_empty() {
        return 0;
    }

    let mut score: i32 = 60;

    match listing.tenure {
        Tenure::Freehold => {
            score += 15;
            if listing.tenure_confidence > 0.8 {
                score += 5;
            }
        }
        Tenure::Unknown => score += 5,
        Tenure::Leasehold | Tenure::ShareOfFreehold => {}
    }

    score += match listing.estimated_units {
        Some(3..=6) => 10,
        Some(2 | 7 | 8) => 5,
        Some(9..) => 3,
        _ => 0,
    };

    score += match listing.price_per_unit() {
        Some(price) if price < 50_000 => 10,
        Some(price) if price < 75_000 => 5,
        Some(price) if price < 100_000 => 2,
        _ => 0,
    };

    score -= warnings.len() as i32 * 2;

    score.clamp(10, 100) as u8
}
