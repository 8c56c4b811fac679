// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # competency-rollup
//!
//! Competency rollup and clustering analytics for curriculum outcome tracking.
//! Binary achievement facts recorded per Course Learning Outcome (CLO) are
//! rolled up through a weighted link graph to Performance Indicators (PI) and
//! Program Learning Outcomes (PLO), then students are clustered by achievement
//! pattern to produce a reordered heatmap.
//!
//! ## Architecture
//!
//! - **Achievement resolver** (`achievement`): last-write-wins de-duplication of raw rows
//! - **Link graph** (`graph`): petgraph-backed PI/PLO → CLO dependency index
//! - **Rollup** (`rollup`): counting and weighted achievement ratios
//! - **Feature matrix** (`matrix`): dense students × outcomes matrix, min–max normalized
//! - **Clustering** (`cluster`): deterministic k-means with silhouette-based auto-k
//! - **Engine** (`engine`): the whole pipeline over one [`snapshot::Snapshot`]
//!
//! ## Library usage
//!
//! ```no_run
//! use competency_rollup::config::AnalyticsConfig;
//! use competency_rollup::engine::Engine;
//! use competency_rollup::outcome::Granularity;
//! use competency_rollup::snapshot::Snapshot;
//!
//! let snapshot = Snapshot::load(std::path::Path::new("framework.json")).unwrap();
//! let engine = Engine::new(&AnalyticsConfig::default()).unwrap();
//! let report = engine.heatmap(&snapshot, Granularity::Plo).unwrap();
//! println!("display order: {:?}", report.row_order);
//! ```

pub mod achievement;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod graph;
pub mod matrix;
pub mod outcome;
pub mod rollup;
pub mod snapshot;
