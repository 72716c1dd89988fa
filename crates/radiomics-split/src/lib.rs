//! Training/test splitting of patient cohorts
//!
//! This crate turns a labelled cohort into training and test sets and keeps
//! that split consistent while labels, cohort and splitting options change.
//!
//! # Overview
//!
//! - [`splitter`]: stratified random sampling that preserves the share of each
//!   outcome class in the training set
//! - [`assignment`]: the resulting [`SplitAssignment`](assignment::SplitAssignment)
//!   and manual transfers of patients between its two sides
//! - [`state`]: persisted splitting fields and partial updates keyed by backend
//!   field name
//! - [`controller`]: full-dataset / train-test-split modes, automatic versus
//!   manual maintenance, and the recomputation rules tying them together
//!
//! Everything here is synchronous and free of I/O. Persistence goes through the
//! [`SplitBackend`](controller::SplitBackend) trait implemented by the caller.
//!
//! # Examples
//!
//! ```
//! use radiomics_cohort::{
//!     label::{LabelCategory, LabelRecord, ModelType},
//!     patient::PatientId,
//! };
//! use radiomics_split::{
//!     controller::{SplitController, SplitInputs, SplitSettings},
//!     state::{DataSplittingType, SplitState},
//! };
//!
//! let cohort = (1..=9).map(|i| PatientId::new(format!("P{i}"))).collect::<Vec<_>>();
//! let labels = cohort
//!     .iter()
//!     .enumerate()
//!     .map(|(i, id)| LabelRecord::new(id.clone(), [("Outcome", if i % 3 == 0 { "1" } else { "0" })]))
//!     .collect();
//! let category = LabelCategory::new("Response", ModelType::Classification, labels)?;
//!
//! let mut controller =
//!     SplitController::new(SplitState::default(), SplitSettings::default(), cohort.len(), rand::rng());
//! let inputs = SplitInputs::new(&cohort, Some(&category));
//!
//! let pending = controller.set_data_splitting_type(DataSplittingType::TrainTestSplit, &inputs);
//! // ... send `pending.update` to the backend, then:
//! assert!(controller.commit(&pending));
//!
//! let split = controller.state().assignment()?.unwrap();
//! assert_eq!(split.training().len(), 6);
//! assert_eq!(split.test().len(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use radiomics_cohort::patient::PatientId;

pub mod assignment;
pub mod controller;
pub mod splitter;
pub mod state;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SplitError {
    #[display("Patient '{patient_id}' is in both the training and the test set")]
    Overlap { patient_id: PatientId },
    #[display("Test patients are stored without training patients")]
    IncompleteSplit,
    #[display("No training/test split is stored")]
    NoSplit,
    #[display("Unknown patient set '{name}' (expected 'training' or 'test')")]
    UnknownPatientSet { name: String },
    #[display("Unknown data splitting type '{name}' (expected 'full' or 'split')")]
    UnknownSplittingType { name: String },
}
