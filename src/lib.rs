//! renderlens: classify how a web page is rendered
//!
//! Heuristic detectors read a [`page::PageSnapshot`] and report SSR and CSR
//! evidence; the [`analyzer::Analyzer`] merges it and [`scoring::classify`]
//! turns the totals into a verdict with a confidence.

pub mod analyzer;
pub mod commands;
pub mod config;
pub mod detect;
pub mod error;
pub mod models;
pub mod page;
pub mod progress;
pub mod scoring;
pub mod telemetry;

pub use analyzer::Analyzer;
pub use error::{Error, Result};
pub use models::AnalysisResult;
pub use page::PageSnapshot;
pub use scoring::RenderType;
