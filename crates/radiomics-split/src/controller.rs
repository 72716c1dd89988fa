//! Splitting mode controller
//!
//! [`SplitController`] owns the splitting state of one extraction or
//! collection and decides when the stratified split must be (re)computed. It
//! performs no I/O: every decision is returned as a [`PendingUpdate`] that the
//! caller sends to the backend and then hands back through
//! [`SplitController::commit`].
//!
//! # States
//!
//! ```text
//!                 set_data_splitting_type(TrainTestSplit)
//!   FULL_DATASET ─────────────────────────────────────────▶ TRAIN_TEST_SPLIT
//!        ▲          (initial split if none is persisted)      ├─ AUTO
//!        │                                                    └─ MANUAL
//!        └────────────────────────────────────────────────────────┘
//!          set_data_splitting_type(FullDataset)
//!          (split cleared, requested count back to the default)
//! ```
//!
//! While a split is in use, [`SplitController::sync`] recomputes it exactly
//! once for every change of the outcome labels, in both sub-modes; manual
//! transfers are discarded by such a change. In `AUTO` mode a change of the
//! cohort or of the requested training count also recomputes the split. In
//! `MANUAL` mode only transfers move patients.
//!
//! # Ordering
//!
//! Each issued update carries a [`Ticket`]. Only the most recently issued
//! update is applied on commit; older ones are discarded, so the latest input
//! wins when updates overlap. After [`SplitController::detach`] every commit
//! is ignored.

use std::collections::BTreeSet;

use radiomics_cohort::{
    label::{LabelCategory, LabelRecord},
    patient::PatientId,
};
use rand::Rng;

use crate::{
    SplitError,
    assignment::{PatientSet, SplitAssignment},
    splitter,
    state::{DataSplittingType, SplitState, SplitUpdate, TrainTestSplitType},
};

/// Default share of the cohort put in the training set.
pub const DEFAULT_TRAINING_FRACTION: f64 = 0.67;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitSettings {
    pub default_training_fraction: f64,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            default_training_fraction: DEFAULT_TRAINING_FRACTION,
        }
    }
}

impl SplitSettings {
    /// Training count used when no split has been chosen yet.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn default_training_count(&self, cohort_len: usize) -> usize {
        (cohort_len as f64 * self.default_training_fraction).round() as usize
    }
}

/// Inputs the split is derived from.
#[derive(Debug, Clone, Copy)]
pub struct SplitInputs<'a> {
    /// Patients offered to the splitter (see [`resolve_data_points`]).
    pub cohort: &'a [PatientId],
    /// Outcome definition currently selected, if any.
    pub category: Option<&'a LabelCategory>,
}

impl<'a> SplitInputs<'a> {
    #[must_use]
    pub fn new(cohort: &'a [PatientId], category: Option<&'a LabelCategory>) -> Self {
        Self { cohort, category }
    }

    fn outcomes(&self) -> Option<Vec<LabelRecord>> {
        self.category.map(|c| c.outcomes_for(self.cohort))
    }
}

/// Identifier of an issued update, increasing with every issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// An update waiting to be persisted and committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    pub ticket: Ticket,
    pub update: SplitUpdate,
}

/// Persistence of split updates.
///
/// Implementations return once the update is stored. Errors are returned to
/// the caller as they are.
pub trait SplitBackend {
    type Error;

    fn update(&mut self, update: &SplitUpdate) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    outcomes: Option<Vec<LabelRecord>>,
    cohort: BTreeSet<PatientId>,
}

impl Snapshot {
    fn capture(inputs: &SplitInputs<'_>) -> Self {
        Self {
            outcomes: inputs.outcomes(),
            cohort: inputs.cohort.iter().cloned().collect(),
        }
    }
}

#[derive(Debug)]
pub struct SplitController<R> {
    settings: SplitSettings,
    state: SplitState,
    requested_training_count: usize,
    /// Set once the caller chose a training count; cleared when leaving split mode.
    count_requested: bool,
    previous: Option<Snapshot>,
    last_issued: u64,
    detached: bool,
    rng: R,
}

impl<R> SplitController<R>
where
    R: Rng,
{
    /// Creates a controller for a persisted `state`.
    ///
    /// The requested training count starts at the size of the persisted
    /// training set, or at the default count for `cohort_len` patients.
    #[must_use]
    pub fn new(state: SplitState, settings: SplitSettings, cohort_len: usize, rng: R) -> Self {
        let requested_training_count = state
            .training_patients
            .as_ref()
            .map_or_else(|| settings.default_training_count(cohort_len), Vec::len);
        Self {
            settings,
            state,
            requested_training_count,
            count_requested: false,
            previous: None,
            last_issued: 0,
            detached: false,
            rng,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SplitState {
        &self.state
    }

    #[must_use]
    pub fn requested_training_count(&self) -> usize {
        self.requested_training_count
    }

    /// Computes a fresh stratified split of `inputs` without issuing anything.
    pub fn compute_split(&mut self, inputs: &SplitInputs<'_>) -> Option<SplitAssignment> {
        let category = inputs.category?;
        let outcomes = category.outcomes_for(inputs.cohort);
        splitter::split_by_outcome(
            inputs.cohort,
            &outcomes,
            category.label_type,
            self.requested_training_count,
            &mut self.rng,
        )
    }

    /// Reacts to the current inputs.
    ///
    /// Call this whenever the cohort or the selected label category may have
    /// changed. Returns an update when the split has to be created, cleared or
    /// recomputed. While no split is stored the training count falls back to
    /// the default, unless one was set with
    /// [`set_requested_training_count`](Self::set_requested_training_count).
    pub fn sync(&mut self, inputs: &SplitInputs<'_>) -> Option<PendingUpdate> {
        let snapshot = Snapshot::capture(inputs);
        let previous = self.previous.replace(snapshot.clone());

        if !self.state.has_split() && !self.count_requested {
            self.requested_training_count = self.settings.default_training_count(inputs.cohort.len());
        }

        match self.state.data_splitting_type {
            DataSplittingType::FullDataset => {
                if !self.state.has_split() {
                    return None;
                }
                log::debug!("Full dataset in use, clearing persisted split");
                self.reset_training_count(inputs.cohort.len());
                Some(self.issue(SplitUpdate::patients(None)))
            }
            DataSplittingType::TrainTestSplit => {
                let labels_changed = previous
                    .as_ref()
                    .is_some_and(|p| p.outcomes != snapshot.outcomes);
                let cohort_changed = self.state.train_test_split_type.is_auto()
                    && previous.as_ref().is_some_and(|p| p.cohort != snapshot.cohort);
                let needs_initial = !self.state.has_split() && inputs.category.is_some();

                if needs_initial {
                    log::debug!("No persisted split, creating the initial split");
                } else if labels_changed {
                    log::debug!("Outcomes changed, recomputing the split");
                } else if cohort_changed {
                    log::debug!("Cohort changed, recomputing the split");
                } else {
                    return None;
                }
                self.resplit(inputs)
            }
        }
    }

    /// Switches between the full dataset and a train/test split.
    ///
    /// The split method is reset to automatic. Entering split mode without a
    /// persisted split creates one; leaving it clears the persisted split and
    /// restores the default training count.
    pub fn set_data_splitting_type(
        &mut self,
        data_splitting_type: DataSplittingType,
        inputs: &SplitInputs<'_>,
    ) -> PendingUpdate {
        let mut update = SplitUpdate::splitting_type(data_splitting_type);
        match data_splitting_type {
            DataSplittingType::TrainTestSplit if !self.state.has_split() => {
                if !self.count_requested {
                    self.requested_training_count =
                        self.settings.default_training_count(inputs.cohort.len());
                }
                if let Some(split) = self.compute_split(inputs) {
                    update.set_patients(Some(split));
                }
            }
            DataSplittingType::FullDataset if self.state.has_split() => {
                self.reset_training_count(inputs.cohort.len());
                update.set_patients(None);
            }
            _ => {}
        }
        self.issue(update)
    }

    /// Switches between automatic and manual splitting. Never resamples.
    pub fn set_train_test_split_type(
        &mut self,
        train_test_split_type: TrainTestSplitType,
    ) -> PendingUpdate {
        self.issue(SplitUpdate::split_type(train_test_split_type))
    }

    /// Changes the requested training set size.
    ///
    /// In automatic split mode the split is recomputed with the new size;
    /// otherwise the count is only recorded.
    pub fn set_requested_training_count(
        &mut self,
        count: usize,
        inputs: &SplitInputs<'_>,
    ) -> Option<PendingUpdate> {
        self.requested_training_count = count;
        self.count_requested = true;
        let auto_split = self.state.data_splitting_type.is_train_test_split()
            && self.state.train_test_split_type.is_auto();
        if !auto_split {
            return None;
        }
        self.resplit(inputs)
    }

    /// Moves patients between the persisted training and test sets.
    pub fn transfer(
        &mut self,
        patients: &[PatientId],
        source: PatientSet,
        destination: PatientSet,
    ) -> Result<PendingUpdate, SplitError> {
        let current = self.state.assignment()?.ok_or(SplitError::NoSplit)?;
        if !self.state.train_test_split_type.is_manual() {
            log::warn!("Transferring patients while the split is automatic");
        }
        let moved = current.transfer(patients, source, destination);
        Ok(self.issue(SplitUpdate::patients(Some(moved))))
    }

    /// Applies `pending` if it is the most recently issued update.
    ///
    /// Returns whether the update was applied.
    pub fn commit(&mut self, pending: &PendingUpdate) -> bool {
        if self.detached {
            log::debug!("Controller detached, ignoring update {:?}", pending.ticket);
            return false;
        }
        if !self.is_current(pending) {
            log::debug!("Discarding stale update {:?}", pending.ticket);
            return false;
        }
        self.state.apply(&pending.update);
        if let Some(Some(training)) = &pending.update.training_patients {
            self.requested_training_count = training.len();
        }
        true
    }

    /// Sends `pending` to `backend` and commits it once stored.
    ///
    /// Outdated updates, and any update after [`detach`](Self::detach), are
    /// not sent and return `Ok(false)`. Backend errors are returned unchanged
    /// and leave the state untouched.
    pub fn persist<B>(&mut self, backend: &mut B, pending: &PendingUpdate) -> Result<bool, B::Error>
    where
        B: SplitBackend,
    {
        if self.detached || !self.is_current(pending) {
            log::debug!("Not persisting outdated update {:?}", pending.ticket);
            return Ok(false);
        }
        backend.update(&pending.update)?;
        Ok(self.commit(pending))
    }

    /// Stops applying updates; results arriving afterwards are ignored.
    pub fn detach(&mut self) {
        self.detached = true;
    }

    fn is_current(&self, pending: &PendingUpdate) -> bool {
        pending.ticket == Ticket(self.last_issued)
    }

    fn reset_training_count(&mut self, cohort_len: usize) {
        self.requested_training_count = self.settings.default_training_count(cohort_len);
        self.count_requested = false;
    }

    fn resplit(&mut self, inputs: &SplitInputs<'_>) -> Option<PendingUpdate> {
        let split = self.compute_split(inputs);
        if split.is_none() && !self.state.has_split() {
            return None;
        }
        Some(self.issue(SplitUpdate::patients(split)))
    }

    fn issue(&mut self, update: SplitUpdate) -> PendingUpdate {
        self.last_issued += 1;
        PendingUpdate {
            ticket: Ticket(self.last_issued),
            update,
        }
    }
}

/// Patients the split is computed over.
///
/// Without a label category every patient is used. When `persisted` holds the
/// split stored on a collection, its patients define the cohort. Otherwise the
/// patients without a usable label are left out.
pub fn resolve_data_points(
    all_patients: &[PatientId],
    category: Option<&LabelCategory>,
    persisted: Option<&SplitAssignment>,
) -> Vec<PatientId> {
    let Some(category) = category else {
        return all_patients.to_vec();
    };
    if let Some(split) = persisted {
        return split.patients().cloned().collect();
    }
    let unlabelled = category
        .unlabelled_patients(all_patients)
        .into_iter()
        .collect::<BTreeSet<_>>();
    all_patients
        .iter()
        .filter(|id| !unlabelled.contains(id))
        .cloned()
        .collect()
}
