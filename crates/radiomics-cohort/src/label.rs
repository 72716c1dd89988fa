//! Outcome labels and label categories
//!
//! A [`LabelCategory`] is a named outcome definition holding one
//! [`LabelRecord`] per patient. Its [`ModelType`] decides which outcome
//! columns a record needs to be usable and which column stratifies the cohort
//! when it is split into training and test sets:
//!
//! | model type       | required columns  | stratum column |
//! |------------------|-------------------|----------------|
//! | `Classification` | `Outcome`         | `Outcome`      |
//! | `Survival`       | `Time`, `Event`   | `Event`        |
//!
//! # Examples
//!
//! ```
//! use radiomics_cohort::{
//!     label::{LabelCategory, LabelRecord, ModelType},
//!     patient::PatientId,
//! };
//!
//! let category = LabelCategory::new(
//!     "Recurrence",
//!     ModelType::Classification,
//!     vec![
//!         LabelRecord::new("P1", [("Outcome", "1")]),
//!         LabelRecord::new("P2", [("Outcome", "")]),
//!     ],
//! )?;
//!
//! let cohort = ["P1", "P2", "P3"].map(PatientId::from);
//! let unlabelled = category.unlabelled_patients(&cohort);
//! assert_eq!(unlabelled, ["P2", "P3"].map(PatientId::from));
//! # Ok::<(), radiomics_cohort::CohortError>(())
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{CohortError, patient::PatientId};

pub const OUTCOME_COLUMN: &str = "Outcome";
pub const TIME_COLUMN: &str = "Time";
pub const EVENT_COLUMN: &str = "Event";

const CLASSIFICATION_OUTCOMES: &[&str] = &[OUTCOME_COLUMN];
const SURVIVAL_OUTCOMES: &[&str] = &[TIME_COLUMN, EVENT_COLUMN];

/// Kind of outcome a label category describes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Classification,
    Survival,
}

impl ModelType {
    /// Columns a label record must carry to be usable for this model type.
    #[must_use]
    pub fn outcome_columns(self) -> &'static [&'static str] {
        match self {
            Self::Classification => CLASSIFICATION_OUTCOMES,
            Self::Survival => SURVIVAL_OUTCOMES,
        }
    }

    /// Column whose value defines the stratum of a patient.
    #[must_use]
    pub fn stratum_column(self) -> &'static str {
        match self {
            Self::Classification => OUTCOME_COLUMN,
            Self::Survival => EVENT_COLUMN,
        }
    }
}

/// Outcome of one patient, keyed by outcome column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub patient_id: PatientId,
    pub label_content: BTreeMap<String, String>,
}

impl LabelRecord {
    #[must_use]
    pub fn new<P, I, K, V>(patient_id: P, content: I) -> Self
    where
        P: Into<PatientId>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            patient_id: patient_id.into(),
            label_content: content
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of the stratum column for `model_type`, if present.
    #[must_use]
    pub fn stratum(&self, model_type: ModelType) -> Option<&str> {
        self.label_content
            .get(model_type.stratum_column())
            .map(String::as_str)
    }
}

/// A named outcome definition with its per-patient labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCategory {
    pub name: String,
    pub label_type: ModelType,
    pub labels: Vec<LabelRecord>,
}

impl LabelCategory {
    /// Creates a category, rejecting more than one record for a patient.
    pub fn new(
        name: impl Into<String>,
        label_type: ModelType,
        labels: Vec<LabelRecord>,
    ) -> Result<Self, CohortError> {
        let category = Self {
            name: name.into(),
            label_type,
            labels,
        };
        category.validate()?;
        Ok(category)
    }

    /// Checks that every patient has at most one label record.
    pub fn validate(&self) -> Result<(), CohortError> {
        let mut seen = HashSet::new();
        for record in &self.labels {
            if !seen.insert(&record.patient_id) {
                return Err(CohortError::DuplicateLabel {
                    category: self.name.clone(),
                    patient_id: record.patient_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Whether `record` carries every outcome column with a non-empty value.
    ///
    /// Any empty column makes the record unusable, even one that is not an
    /// outcome column of this category.
    #[must_use]
    pub fn is_labelled(&self, record: &LabelRecord) -> bool {
        let no_empty_value = record.label_content.values().all(|v| !v.is_empty());
        let has_all_columns = self
            .label_type
            .outcome_columns()
            .iter()
            .all(|column| record.label_content.contains_key(*column));
        no_empty_value && has_all_columns
    }

    /// Patients of `cohort` without a usable label, in cohort order.
    #[must_use]
    pub fn unlabelled_patients(&self, cohort: &[PatientId]) -> Vec<PatientId> {
        let labelled = self
            .labels
            .iter()
            .filter(|record| self.is_labelled(record))
            .map(|record| &record.patient_id)
            .collect::<HashSet<_>>();
        let unlabelled = cohort
            .iter()
            .filter(|id| !labelled.contains(id))
            .cloned()
            .collect::<Vec<_>>();
        if !unlabelled.is_empty() {
            log::debug!(
                "Category '{}' has no usable label for {} of {} patients",
                self.name,
                unlabelled.len(),
                cohort.len()
            );
        }
        unlabelled
    }

    /// Label records of patients that belong to `cohort`.
    #[must_use]
    pub fn outcomes_for(&self, cohort: &[PatientId]) -> Vec<LabelRecord> {
        let cohort = cohort.iter().collect::<HashSet<_>>();
        self.labels
            .iter()
            .filter(|record| cohort.contains(&record.patient_id))
            .cloned()
            .collect()
    }
}
