//! Loan-Level Feature Preparation
//!
//! Deterministic batch engine that turns raw loan-level mortgage records
//! into an analysis-ready feature table for downstream regression.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        pipeline::run                        │
//! │   (owns the loan table, drives stage order, builds report)  │
//! └─────────────────────────────────────────────────────────────┘
//!          │                │                       │
//!          ▼                ▼                       ▼
//!   ┌────────────┐   ┌─────────────┐        ┌──────────────┐
//!   │  impute    │   │ covariates  │        │   label      │
//!   │ (bucketed  │   │ (CA-FL,     │        │ (event join, │
//!   │  means)    │   │  SATO)      │        │  RESPONSE)   │
//!   └────────────┘   └──────┬──────┘        └──────────────┘
//!                           │
//!                           ▼
//!                    ┌─────────────┐        ┌──────────────┐
//!                    │  windows    │───────▶│   series     │
//!                    │ (HPI ratio, │        │ (month-keyed │
//!                    │  rate drop) │        │  lookups)    │
//!                    └─────────────┘        └──────────────┘
//! ```
//!
//! # Determinism Guarantees
//!
//! - **Stage order is fixed**: imputation passes feed each other and must
//!   run score → DTI → LTV → global sweep; covariates, windows and labels
//!   follow in that order.
//! - **No interpolation**: reference-series lookups are exact month matches
//!   or typed not-found, never nearest-date.
//! - **Calendar arithmetic is single-sourced**: all year offsets go through
//!   `calendar::add_years` with one documented clamping rule.
//! - **Parallelism cannot change results**: the per-loan sweeps read only
//!   the loan's own record plus shared read-only indices.

pub mod calendar;
pub mod covariates;
pub mod error;
pub mod impute;
pub mod label;
pub mod pipeline;
pub mod series;
pub mod table;
pub mod windows;

#[cfg(test)]
mod label_tests;

pub use error::PrepError;
pub use pipeline::{run, PrepReport};
pub use table::{FeatureRow, FeatureTable, LoanRecord, LoanTable};
