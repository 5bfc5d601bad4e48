//! # maintenance-ml: Predictive Maintenance Round Trip
//!
//! **Version**: 0.1.0
//!
//! Fits a random-forest regressor for Remaining Useful Life (`RUL`), logs it
//! to a file-backed tracking store, serves predictions over HTTP and reports
//! data drift between two datasets.
//!
//! ```text
//! load → split → fit → evaluate → track → resolve latest → serve
//!                                                   monitor drift
//! ```
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke**: schema errors surface at load time, never mid-fit
//! - **Jidoka**: a run is committed atomically or not at all
//! - **Genchi Genbutsu**: seeded splits and per-tree seeds make RMSE reproducible
//!
//! ## Example Usage
//!
//! ```rust
//! use maintenance_ml::dataset::Dataset;
//! use maintenance_ml::experiment::ExperimentStore;
//! use maintenance_ml::training::{Hyperparameters, Trainer};
//!
//! let x: Vec<f64> = (0..20).map(f64::from).collect();
//! let rul: Vec<f64> = x.iter().map(|v| 100.0 - v).collect();
//! let data = Dataset::from_columns(vec![("feature_1", x), ("RUL", rul)])?;
//!
//! let trainer = Trainer::new(Hyperparameters { n_estimators: 5, ..Hyperparameters::default() });
//! let mut store = ExperimentStore::new();
//! let outcome = trainer.train(&data, &mut store)?;
//! assert_eq!(outcome.validation_rows, 4);
//! # Ok::<(), maintenance_ml::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod experiment;
pub mod metrics;
pub mod model;
pub mod monitoring;
pub mod pipeline;
pub mod serving;
pub mod telemetry;
pub mod training;

pub use error::{Error, Result};
