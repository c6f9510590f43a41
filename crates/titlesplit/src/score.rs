//! Score value types shared by the opportunity scorer and impact assessor.
//!
//! Weighting caps are carried by the types: a [`ScoreBucket`] never exceeds its
//! cap and never drops below zero, and an [`ImpactScore`] always stays within
//! `-100..=100`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Signed running total with saturating arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(i32);

impl Score {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    pub fn clamp(self, min: i32, max: i32) -> Self {
        Self(self.0.clamp(min, max))
    }
}

impl Add for Score {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Add<ImpactScore> for Score {
    type Output = Self;

    fn add(self, rhs: ImpactScore) -> Self::Output {
        Self(self.0.saturating_add(i32::from(rhs.value())))
    }
}

impl Sum for Score {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, score| acc + score)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Points earned towards a capped scoring category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BucketFields")]
pub struct ScoreBucket {
    earned: u32,
    cap: u32,
}

#[derive(Deserialize)]
struct BucketFields {
    earned: u32,
    cap: u32,
}

impl From<BucketFields> for ScoreBucket {
    fn from(fields: BucketFields) -> Self {
        Self {
            earned: fields.earned.min(fields.cap),
            cap: fields.cap,
        }
    }
}

impl ScoreBucket {
    pub const fn empty(cap: u32) -> Self {
        Self { earned: 0, cap }
    }

    /// Bucket that starts full and loses points through [`ScoreBucket::deduct`].
    pub const fn full(cap: u32) -> Self {
        Self { earned: cap, cap }
    }

    pub fn award(&mut self, points: u32) {
        self.earned = self.earned.saturating_add(points).min(self.cap);
    }

    pub fn deduct(&mut self, points: u32) {
        self.earned = self.earned.saturating_sub(points);
    }

    pub const fn earned(&self) -> u32 {
        self.earned
    }

    pub const fn cap(&self) -> u32 {
        self.cap
    }

    pub fn score(&self) -> Score {
        Score(self.earned as i32)
    }
}

/// Signed impact of a single verified fact, bounded to `-100..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i16", into = "i16")]
pub struct ImpactScore(i16);

impl From<i16> for ImpactScore {
    fn from(value: i16) -> Self {
        Self::new(value)
    }
}

impl From<ImpactScore> for i16 {
    fn from(score: ImpactScore) -> Self {
        score.0
    }
}

impl ImpactScore {
    pub const MIN: i16 = -100;
    pub const MAX: i16 = 100;

    pub const BLOCKER: Self = Self(Self::MIN);
    pub const NEUTRAL: Self = Self(0);

    pub fn new(value: i16) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub const fn value(self) -> i16 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}
