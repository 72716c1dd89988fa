//! Training/test split assignments and manual transfers
//!
//! A [`SplitAssignment`] is a pair of disjoint patient lists. Assignments are
//! values: [`SplitAssignment::transfer`] returns a new assignment and leaves the
//! original untouched, so the owner can replace its copy wholesale once the
//! change has been persisted.

use std::collections::HashSet;

use radiomics_cohort::patient::PatientId;
use serde::{Deserialize, Serialize};

use crate::SplitError;

/// One side of a split, named after the backend field that stores it.
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
    derive_more::IsVariant,
)]
pub enum PatientSet {
    #[serde(rename = "training_patients")]
    #[display("training_patients")]
    Training,
    #[serde(rename = "test_patients")]
    #[display("test_patients")]
    Test,
}

impl PatientSet {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Training => Self::Test,
            Self::Test => Self::Training,
        }
    }
}

impl std::str::FromStr for PatientSet {
    type Err = SplitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "training" | "training_patients" => Ok(Self::Training),
            "test" | "test_patients" => Ok(Self::Test),
            _ => Err(SplitError::UnknownPatientSet { name: s.to_owned() }),
        }
    }
}

/// Disjoint training and test patient lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAssignment {
    training: Vec<PatientId>,
    test: Vec<PatientId>,
}

impl SplitAssignment {
    /// Creates an assignment, rejecting a patient present on both sides.
    pub fn new(training: Vec<PatientId>, test: Vec<PatientId>) -> Result<Self, SplitError> {
        let training_set = training.iter().collect::<HashSet<_>>();
        if let Some(patient_id) = test.iter().find(|id| training_set.contains(id)) {
            return Err(SplitError::Overlap {
                patient_id: patient_id.clone(),
            });
        }
        Ok(Self { training, test })
    }

    /// Builds an assignment whose test side is every cohort patient not in `training`.
    pub(crate) fn from_training(training: Vec<PatientId>, cohort: &[PatientId]) -> Self {
        let training_set = training.iter().collect::<HashSet<_>>();
        let test = cohort
            .iter()
            .filter(|id| !training_set.contains(id))
            .cloned()
            .collect();
        Self { training, test }
    }

    #[must_use]
    pub fn training(&self) -> &[PatientId] {
        &self.training
    }

    #[must_use]
    pub fn test(&self) -> &[PatientId] {
        &self.test
    }

    #[must_use]
    pub fn get(&self, set: PatientSet) -> &[PatientId] {
        match set {
            PatientSet::Training => &self.training,
            PatientSet::Test => &self.test,
        }
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<PatientId>, Vec<PatientId>) {
        (self.training, self.test)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.training.len() + self.test.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.training.is_empty() && self.test.is_empty()
    }

    /// Which side `patient_id` is on, if any.
    #[must_use]
    pub fn side_of(&self, patient_id: &PatientId) -> Option<PatientSet> {
        if self.training.contains(patient_id) {
            Some(PatientSet::Training)
        } else if self.test.contains(patient_id) {
            Some(PatientSet::Test)
        } else {
            None
        }
    }

    /// Training patients followed by test patients.
    pub fn patients(&self) -> impl Iterator<Item = &PatientId> {
        self.training.iter().chain(&self.test)
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn training_fraction(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.training.len() as f64 / self.len() as f64)
    }

    /// Rounded training percentage and its complement to 100.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn percentages(&self) -> (u32, u32) {
        let training = self
            .training_fraction()
            .map_or(0, |f| (f * 100.0).round() as u32);
        (training, 100 - training)
    }

    /// Moves `patients` from `source` to `destination`.
    ///
    /// Patients are removed from the source list and appended to the
    /// destination list unless already there. `source == destination` is a
    /// caller bug: it is logged and the assignment is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use radiomics_cohort::patient::PatientId;
    /// use radiomics_split::assignment::{PatientSet, SplitAssignment};
    ///
    /// let split = SplitAssignment::new(
    ///     ["P1", "P2", "P3"].map(PatientId::from).to_vec(),
    ///     ["P4"].map(PatientId::from).to_vec(),
    /// )?;
    /// let moved = split.transfer(&[PatientId::from("P2")], PatientSet::Training, PatientSet::Test);
    /// assert_eq!(moved.training(), ["P1", "P3"].map(PatientId::from));
    /// assert_eq!(moved.test(), ["P4", "P2"].map(PatientId::from));
    /// # Ok::<(), radiomics_split::SplitError>(())
    /// ```
    #[must_use]
    pub fn transfer(
        &self,
        patients: &[PatientId],
        source: PatientSet,
        destination: PatientSet,
    ) -> Self {
        if source == destination {
            log::error!("Invalid source for patient transfer: {source} is also the destination");
            return self.clone();
        }
        log::debug!(
            "Transferring {} patients from {source} to {destination}",
            patients.len()
        );

        let moving = patients.iter().collect::<HashSet<_>>();
        let remaining = self
            .get(source)
            .iter()
            .filter(|id| !moving.contains(id))
            .cloned()
            .collect::<Vec<_>>();

        let mut extended = self.get(destination).to_vec();
        let mut present = extended.iter().cloned().collect::<HashSet<_>>();
        for id in patients {
            if present.insert(id.clone()) {
                extended.push(id.clone());
            }
        }

        match source {
            PatientSet::Training => Self {
                training: remaining,
                test: extended,
            },
            PatientSet::Test => Self {
                training: extended,
                test: remaining,
            },
        }
    }
}
