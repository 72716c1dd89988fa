//! Stratified random training/test splitting
//!
//! Splits a cohort so that every outcome class keeps roughly the same share
//! of the training set as it has in the cohort.
//!
//! # Algorithm
//!
//! ```text
//! labels ──filter by cohort──▶ group by stratum key
//!                                    │
//!                 per stratum of size n: sample ⌊n·k / |cohort|⌋ without replacement
//!                                    │
//!                       concatenate ─┴─▶ training
//!                                    │
//!        |training| < min(k, |cohort|) ?  add one random non-training patient
//!                                    │
//!                      test = cohort \ training
//! ```
//!
//! Per-stratum sample sizes are truncated, so the training set can come out
//! smaller than requested. Only a single patient is added to close that gap;
//! when truncation loses more than one patient across strata the training set
//! stays short by the remainder.
//!
//! Patients of the cohort without a label record end up in the test set when a
//! split is performed; callers exclude unlabelled patients from the cohort
//! beforehand (see [`crate::controller::resolve_data_points`]).
//!
//! # Randomness
//!
//! Sampling draws from the provided [`Rng`]. Two calls with the same inputs give
//! different splits unless a seeded generator is passed, e.g.
//! `rand_pcg::Pcg32::seed_from_u64(seed)`.

use std::collections::{BTreeMap, HashSet};

use radiomics_cohort::{
    label::{LabelRecord, ModelType},
    patient::PatientId,
};
use rand::{Rng, seq::IndexedRandom};

use crate::assignment::SplitAssignment;

/// Splits `cohort` into training and test sets, stratified by `stratum_key`.
///
/// Returns `None` when no split can be performed: `requested_training_count`
/// is zero, or there are no labels at all.
///
/// # Examples
///
/// ```
/// use radiomics_cohort::{label::LabelRecord, patient::PatientId};
/// use radiomics_split::splitter;
///
/// let cohort = (1..=10).map(|i| PatientId::new(format!("P{i}"))).collect::<Vec<_>>();
/// let labels = cohort
///     .iter()
///     .enumerate()
///     .map(|(i, id)| LabelRecord::new(id.clone(), [("Outcome", if i < 6 { "1" } else { "0" })]))
///     .collect::<Vec<_>>();
///
/// let split = splitter::split(&cohort, &labels, 5, |l| l.label_content["Outcome"].clone(), &mut rand::rng())
///     .unwrap();
/// assert_eq!(split.training().len(), 5);
/// assert_eq!(split.test().len(), 5);
/// ```
pub fn split<F, K, R>(
    cohort: &[PatientId],
    labels: &[LabelRecord],
    requested_training_count: usize,
    mut stratum_key: F,
    rng: &mut R,
) -> Option<SplitAssignment>
where
    F: FnMut(&LabelRecord) -> K,
    K: Ord,
    R: Rng + ?Sized,
{
    if requested_training_count == 0 || labels.is_empty() {
        return None;
    }

    let members = cohort.iter().collect::<HashSet<_>>();
    let mut seen = HashSet::new();
    let mut strata: BTreeMap<K, Vec<&PatientId>> = BTreeMap::new();
    for record in labels {
        if !members.contains(&record.patient_id) {
            continue;
        }
        if !seen.insert(&record.patient_id) {
            log::warn!(
                "Ignoring duplicate label for patient {}",
                record.patient_id
            );
            continue;
        }
        strata
            .entry(stratum_key(record))
            .or_default()
            .push(&record.patient_id);
    }

    let cohort_len = cohort.len();
    let mut training = Vec::with_capacity(requested_training_count.min(cohort_len));
    for patients in strata.values() {
        let amount = patients.len() * requested_training_count / cohort_len;
        training.extend(
            patients
                .choose_multiple(rng, amount)
                .map(|&id| id.clone()),
        );
    }

    let max_training = requested_training_count.min(cohort_len);
    if training.len() < max_training {
        let chosen = training.iter().collect::<HashSet<_>>();
        let pool = cohort
            .iter()
            .filter(|id| !chosen.contains(id))
            .collect::<Vec<_>>();
        if let Some(&extra) = pool.choose(rng) {
            log::debug!(
                "Stratified sample has {} of {max_training} patients, adding {extra}",
                training.len()
            );
            training.push(extra.clone());
        }
    }

    Some(SplitAssignment::from_training(training, cohort))
}

/// [`split`] stratified by the outcome column of `model_type`.
///
/// Classification labels are grouped by their `Outcome` value, survival
/// labels by their `Event` value. Records missing the column form a stratum
/// of their own.
pub fn split_by_outcome<R>(
    cohort: &[PatientId],
    labels: &[LabelRecord],
    model_type: ModelType,
    requested_training_count: usize,
    rng: &mut R,
) -> Option<SplitAssignment>
where
    R: Rng + ?Sized,
{
    split(
        cohort,
        labels,
        requested_training_count,
        |record| record.stratum(model_type).map(str::to_owned),
        rng,
    )
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn cohort(n: usize) -> Vec<PatientId> {
        (1..=n).map(|i| PatientId::new(format!("P{i}"))).collect()
    }

    /// Labels the first `positives` patients "positive" and the rest "negative".
    fn classification_labels(cohort: &[PatientId], positives: usize) -> Vec<LabelRecord> {
        cohort
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let outcome = if i < positives { "positive" } else { "negative" };
                LabelRecord::new(id.clone(), [("Outcome", outcome)])
            })
            .collect()
    }

    fn count_outcome(split: &[PatientId], labels: &[LabelRecord], outcome: &str) -> usize {
        labels
            .iter()
            .filter(|l| l.label_content["Outcome"] == outcome && split.contains(&l.patient_id))
            .count()
    }

    fn assert_partition(split: &SplitAssignment, cohort: &[PatientId]) {
        let training = split.training().iter().collect::<HashSet<_>>();
        let test = split.test().iter().collect::<HashSet<_>>();
        assert_eq!(training.len(), split.training().len(), "duplicate in training");
        assert_eq!(test.len(), split.test().len(), "duplicate in test");
        assert!(training.is_disjoint(&test));
        let union = training.union(&test).copied().collect::<HashSet<_>>();
        assert_eq!(union, cohort.iter().collect::<HashSet<_>>());
    }

    #[test]
    fn test_no_split_without_request_or_labels() {
        let cohort = cohort(4);
        let labels = classification_labels(&cohort, 2);
        let mut rng = rand::rng();
        assert!(split_by_outcome(&cohort, &labels, ModelType::Classification, 0, &mut rng).is_none());
        assert!(split_by_outcome(&cohort, &[], ModelType::Classification, 2, &mut rng).is_none());
    }

    #[test]
    fn test_ten_patients_six_four() {
        let cohort = cohort(10);
        let labels = classification_labels(&cohort, 6);
        for _ in 0..50 {
            let split =
                split_by_outcome(&cohort, &labels, ModelType::Classification, 5, &mut rand::rng())
                    .unwrap();
            assert_partition(&split, &cohort);
            assert_eq!(split.training().len(), 5);
            assert_eq!(count_outcome(split.training(), &labels, "positive"), 3);
            assert_eq!(count_outcome(split.training(), &labels, "negative"), 2);
            assert_eq!(split.test().len(), 5);
        }
    }

    #[test]
    fn test_single_gap_fill() {
        // 7 positives, 4 negatives, k = 6: floor(42/11) + floor(24/11) = 3 + 2 = 5
        let cohort = cohort(11);
        let labels = classification_labels(&cohort, 7);
        for _ in 0..50 {
            let split =
                split_by_outcome(&cohort, &labels, ModelType::Classification, 6, &mut rand::rng())
                    .unwrap();
            assert_partition(&split, &cohort);
            assert_eq!(split.training().len(), 6);
        }
    }

    #[test]
    fn test_shortfall_beyond_one_is_kept() {
        // Five strata of 3 patients, k = 8 of 15: each stratum gets floor(24/15) = 1,
        // so 5 sampled + 1 gap fill = 6 < 8
        let cohort = cohort(15);
        let labels = cohort
            .iter()
            .enumerate()
            .map(|(i, id)| LabelRecord::new(id.clone(), [("Outcome", (i % 5).to_string())]))
            .collect::<Vec<_>>();
        let split =
            split_by_outcome(&cohort, &labels, ModelType::Classification, 8, &mut rand::rng())
                .unwrap();
        assert_partition(&split, &cohort);
        assert_eq!(split.training().len(), 6);
    }

    #[test]
    fn test_stratum_fraction_within_one_unit() {
        let cohort = cohort(97);
        let labels = cohort
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let outcome = match i % 7 {
                    0 => "a",
                    1 | 2 => "b",
                    _ => "c",
                };
                LabelRecord::new(id.clone(), [("Outcome", outcome)])
            })
            .collect::<Vec<_>>();
        let k = 60;
        let split =
            split_by_outcome(&cohort, &labels, ModelType::Classification, k, &mut rand::rng())
                .unwrap();
        assert_partition(&split, &cohort);
        assert!(split.training().len() <= k);

        for outcome in ["a", "b", "c"] {
            let stratum = labels
                .iter()
                .filter(|l| l.label_content["Outcome"] == outcome)
                .count();
            let expected = stratum * k / cohort.len();
            let actual = count_outcome(split.training(), &labels, outcome);
            assert!(
                actual.abs_diff(expected) <= 1,
                "stratum {outcome}: expected about {expected}, got {actual}"
            );
        }
    }

    #[test]
    fn test_survival_stratified_by_event() {
        let cohort = cohort(8);
        let labels = cohort
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let event = if i < 4 { "1" } else { "0" };
                LabelRecord::new(id.clone(), [("Time", "100"), ("Event", event)])
            })
            .collect::<Vec<_>>();
        let split =
            split_by_outcome(&cohort, &labels, ModelType::Survival, 4, &mut rand::rng()).unwrap();
        assert_partition(&split, &cohort);
        let events = labels
            .iter()
            .filter(|l| l.label_content["Event"] == "1" && split.training().contains(&l.patient_id))
            .count();
        assert_eq!(events, 2);
        assert_eq!(split.training().len(), 4);
    }

    #[test]
    fn test_labels_outside_cohort_ignored() {
        let all = cohort(6);
        let labels = classification_labels(&all, 3);
        let cohort = all[..4].to_vec();
        let split =
            split_by_outcome(&cohort, &labels, ModelType::Classification, 2, &mut rand::rng())
                .unwrap();
        assert_partition(&split, &cohort);
        assert_eq!(split.training().len(), 2);
    }

    #[test]
    fn test_duplicate_labels_counted_once() {
        let cohort = cohort(4);
        let mut labels = classification_labels(&cohort, 2);
        labels.push(labels[0].clone());
        let split =
            split_by_outcome(&cohort, &labels, ModelType::Classification, 4, &mut rand::rng())
                .unwrap();
        assert_partition(&split, &cohort);
        assert_eq!(split.training().len(), 4);
        assert!(split.test().is_empty());
    }

    #[test]
    fn test_request_above_cohort_size() {
        let cohort = cohort(5);
        let labels = classification_labels(&cohort, 2);
        let split =
            split_by_outcome(&cohort, &labels, ModelType::Classification, 9, &mut rand::rng())
                .unwrap();
        assert_partition(&split, &cohort);
        assert_eq!(split.training().len(), 5);
        assert!(split.test().is_empty());
    }

    #[test]
    fn test_seeded_split_is_reproducible() {
        let cohort = cohort(30);
        let labels = classification_labels(&cohort, 12);
        let first = split_by_outcome(
            &cohort,
            &labels,
            ModelType::Classification,
            20,
            &mut Pcg32::seed_from_u64(7),
        );
        let second = split_by_outcome(
            &cohort,
            &labels,
            ModelType::Classification,
            20,
            &mut Pcg32::seed_from_u64(7),
        );
        assert_eq!(first, second);
    }
}
