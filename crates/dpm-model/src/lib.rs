//! # dpm-model
//!
//! The classifier capability for the defect-prediction mining pipeline:
//! three concrete classifiers (ensemble tree, Gaussian naive Bayes, k-NN)
//! behind one [`classifier::Classifier`] trait and a [`classifier::kind::ClassifierKind`]
//! factory tag, plus the stratified cross-validation and threshold-search
//! tooling the orchestrator and what-if simulator build on.
//!
//! ## Design
//!
//! - **Kind-erased polymorphism**: `Box<dyn Classifier>` lets the orchestrator
//!   hold heterogeneous candidates in one `Vec` and pick a winner without a
//!   match on a type enum at the call site.
//! - **Option strings**: every classifier's hyperparameters round-trip
//!   through a single `String` (`"-I 50"`, `"-K 5"`, `""`), mirroring the
//!   original system's `getOptions`/`setOptions` contract and letting the
//!   tuned winner's options travel as plain data into the persisted model
//!   blob and into the what-if simulator.
//! - **No reflection**: [`classifier::kind::ClassifierKind::build`] is the
//!   explicit factory that replaces dynamic construction-by-name.

pub mod classifier;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod tuning;

pub use classifier::kind::{build_with_options, ClassifierKind};
pub use classifier::{Classifier, TrainingRow, TrainingSet};
pub use descriptor::TrainedModelDescriptor;
pub use error::{ModelError, ModelResult};
pub use tuning::{cross_validate, roc_auc, tune_hyperparameter, youdens_j_threshold, CvMetrics};
