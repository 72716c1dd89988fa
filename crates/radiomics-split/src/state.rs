//! Persisted splitting configuration and partial updates
//!
//! [`SplitState`] mirrors the splitting fields stored on a feature extraction
//! or collection record. Changes are expressed as [`SplitUpdate`]s, partial
//! payloads keyed by the same field names, so they can be sent to the backend
//! as-is and applied locally once the backend accepted them:
//!
//! ```json
//! {"data_splitting_type": "TRAIN_TEST_SPLIT", "train_test_split_type": "AUTO"}
//! {"training_patients": ["P1", "P4"], "test_patients": ["P2", "P3"]}
//! {"training_patients": null, "test_patients": null}
//! ```

use radiomics_cohort::patient::PatientId;
use serde::{Deserialize, Serialize};

use crate::{SplitError, assignment::SplitAssignment};

/// Whether the dataset is split at all.
///
/// Without a split, models are evaluated by cross-validation on every patient.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSplittingType {
    #[default]
    #[display("FULL_DATASET")]
    FullDataset,
    #[display("TRAIN_TEST_SPLIT")]
    TrainTestSplit,
}

impl std::str::FromStr for DataSplittingType {
    type Err = SplitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "full" | "full_dataset" => Ok(Self::FullDataset),
            "split" | "train_test_split" => Ok(Self::TrainTestSplit),
            _ => Err(SplitError::UnknownSplittingType { name: s.to_owned() }),
        }
    }
}

/// How a train/test split is maintained.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
    derive_more::IsVariant,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainTestSplitType {
    /// Randomized stratified split, recomputed when its inputs change.
    #[default]
    Auto,
    /// Patients are only moved by explicit transfers.
    Manual,
}

/// Splitting fields of an extraction or collection record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitState {
    #[serde(default)]
    pub data_splitting_type: DataSplittingType,
    #[serde(default)]
    pub train_test_split_type: TrainTestSplitType,
    #[serde(default)]
    pub training_patients: Option<Vec<PatientId>>,
    #[serde(default)]
    pub test_patients: Option<Vec<PatientId>>,
}

impl SplitState {
    #[must_use]
    pub fn has_split(&self) -> bool {
        self.training_patients.is_some()
    }

    /// The persisted split, if any.
    ///
    /// A missing test list is read as empty; a test list without training
    /// patients, or a patient on both sides, is an error.
    pub fn assignment(&self) -> Result<Option<SplitAssignment>, SplitError> {
        match (&self.training_patients, &self.test_patients) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(SplitError::IncompleteSplit),
            (Some(training), test) => SplitAssignment::new(
                training.clone(),
                test.clone().unwrap_or_default(),
            )
            .map(Some),
        }
    }

    /// Applies the fields present in `update`.
    pub fn apply(&mut self, update: &SplitUpdate) {
        let SplitUpdate {
            data_splitting_type,
            train_test_split_type,
            training_patients,
            test_patients,
        } = update;
        if let Some(t) = data_splitting_type {
            self.data_splitting_type = *t;
        }
        if let Some(t) = train_test_split_type {
            self.train_test_split_type = *t;
        }
        if let Some(patients) = training_patients {
            self.training_patients.clone_from(patients);
        }
        if let Some(patients) = test_patients {
            self.test_patients.clone_from(patients);
        }
    }
}

/// Partial update of a [`SplitState`].
///
/// Absent fields are left unchanged. For patient lists, `Some(None)` clears the
/// list and is sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_splitting_type: Option<DataSplittingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_test_split_type: Option<TrainTestSplitType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_patients: Option<Option<Vec<PatientId>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_patients: Option<Option<Vec<PatientId>>>,
}

impl SplitUpdate {
    /// Switches the splitting type; the split method always restarts as automatic.
    #[must_use]
    pub fn splitting_type(data_splitting_type: DataSplittingType) -> Self {
        Self {
            data_splitting_type: Some(data_splitting_type),
            train_test_split_type: Some(TrainTestSplitType::Auto),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn split_type(train_test_split_type: TrainTestSplitType) -> Self {
        Self {
            train_test_split_type: Some(train_test_split_type),
            ..Self::default()
        }
    }

    /// Stores `assignment`, or clears both patient lists when `None`.
    #[must_use]
    pub fn patients(assignment: Option<SplitAssignment>) -> Self {
        let mut update = Self::default();
        update.set_patients(assignment);
        update
    }

    pub fn set_patients(&mut self, assignment: Option<SplitAssignment>) {
        match assignment {
            Some(assignment) => {
                let (training, test) = assignment.into_parts();
                self.training_patients = Some(Some(training));
                self.test_patients = Some(Some(test));
            }
            None => {
                self.training_patients = Some(None);
                self.test_patients = Some(None);
            }
        }
    }
}
