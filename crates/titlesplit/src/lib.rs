//! Valuation and decision engine for splitting a freehold block of flats into
//! individually registered units.
//!
//! The engine estimates post-split gross development value from comparable
//! sales and EPC evidence, cross-checks it, costs the split and produces a
//! staged recommendation that firms up as verification evidence arrives.

pub mod appraisal;
pub mod config;
pub mod costs;
pub mod domain;
pub mod error;
pub mod evidence;
pub mod recommendation;
pub mod score;
pub mod scoring;
pub mod screening;
pub mod telemetry;
pub mod validation;
pub mod valuation;
pub mod verification;
