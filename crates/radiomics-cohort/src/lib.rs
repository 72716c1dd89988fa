//! Patient cohorts, outcome labels and feature tables
//!
//! This crate holds the data the rest of the toolkit works on:
//!
//! - [`patient`]: patient identifiers, cohort de-duplication and natural ordering
//! - [`label`]: outcome labels grouped in classification or survival label categories,
//!   and detection of patients without a usable label
//! - [`feature_table`]: extracted radiomics features per patient, modality and ROI
//! - [`stats`]: descriptive statistics of a feature over a group of patients
//!
//! # Examples
//!
//! ```
//! use radiomics_cohort::{
//!     feature_table::{FeatureRow, FeatureTable},
//!     label::{LabelCategory, LabelRecord, ModelType},
//! };
//!
//! let table = FeatureTable::new(vec![
//!     FeatureRow {
//!         patient_id: "P1".into(),
//!         modality: "CT".into(),
//!         roi: "GTV".into(),
//!         values: [("original_shape_Volume".to_owned(), 12.5)].into(),
//!     },
//!     FeatureRow {
//!         patient_id: "P2".into(),
//!         modality: "CT".into(),
//!         roi: "GTV".into(),
//!         values: [("original_shape_Volume".to_owned(), 8.0)].into(),
//!     },
//! ]);
//!
//! let category = LabelCategory::new(
//!     "Recurrence",
//!     ModelType::Classification,
//!     vec![LabelRecord::new("P1", [("Outcome", "1")])],
//! )?;
//!
//! let cohort = table.all_patients();
//! assert_eq!(category.unlabelled_patients(&cohort).len(), 1);
//! # Ok::<(), radiomics_cohort::CohortError>(())
//! ```

use crate::patient::PatientId;

pub mod feature_table;
pub mod label;
pub mod patient;
pub mod stats;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CohortError {
    #[display("Label category '{category}' has more than one label for patient '{patient_id}'")]
    DuplicateLabel {
        category: String,
        patient_id: PatientId,
    },
}
