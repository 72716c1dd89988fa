//! Patient identifiers and cohort ordering helpers
//!
//! A cohort is an ordered collection of unique [`PatientId`]s. The order in
//! which patients first appear in the feature table is kept as the cohort
//! order; [`natural_cmp`] gives the presentation order used when listing
//! patients to a user (`P2` before `P10`).

use std::{cmp::Ordering, collections::HashSet, iter::Peekable, str::Chars};

use serde::{Deserialize, Serialize};

/// Identifier of a single patient in a cohort.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PatientId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl AsRef<str> for PatientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Removes duplicate identifiers, keeping the first occurrence of each.
///
/// # Examples
///
/// ```
/// use radiomics_cohort::patient::{PatientId, unique_in_order};
///
/// let ids = ["P2", "P1", "P2", "P3", "P1"].map(PatientId::from);
/// let unique = unique_in_order(ids);
/// assert_eq!(unique, ["P2", "P1", "P3"].map(PatientId::from));
/// ```
#[must_use]
pub fn unique_in_order<I>(ids: I) -> Vec<PatientId>
where
    I: IntoIterator<Item = PatientId>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Compares two identifiers, treating runs of ASCII digits as numbers.
///
/// Letters are compared case-insensitively first; exact byte order breaks
/// remaining ties so the ordering stays total.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut lhs = a.chars().peekable();
    let mut rhs = b.chars().peekable();

    loop {
        match (lhs.peek().copied(), rhs.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut lhs);
                let r_run = take_digits(&mut rhs);
                let ord = cmp_digit_runs(&l_run, &r_run);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                lhs.next();
                rhs.next();
            }
        }
    }
}

/// Sorts identifiers in place using [`natural_cmp`].
pub fn sort_naturally(ids: &mut [PatientId]) {
    ids.sort_by(|a, b| natural_cmp(a.as_str(), b.as_str()));
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_cmp_numeric_runs() {
        assert_eq!(natural_cmp("P2", "P10"), Ordering::Less);
        assert_eq!(natural_cmp("P10", "P2"), Ordering::Greater);
        assert_eq!(natural_cmp("P10", "P10"), Ordering::Equal);
        assert_eq!(natural_cmp("case-9-b", "case-10-a"), Ordering::Less);
    }

    #[test]
    fn test_natural_cmp_leading_zeros() {
        assert_eq!(natural_cmp("P007", "P8"), Ordering::Less);
        // Same numeric value, the raw strings break the tie
        assert_ne!(natural_cmp("P01", "P1"), Ordering::Equal);
    }

    #[test]
    fn test_natural_cmp_case_insensitive_letters() {
        assert_eq!(natural_cmp("abc", "ABD"), Ordering::Less);
        assert_eq!(natural_cmp("b1", "A2"), Ordering::Greater);
    }

    #[test]
    fn test_natural_cmp_prefix() {
        assert_eq!(natural_cmp("P", "P1"), Ordering::Less);
        assert_eq!(natural_cmp("", "P"), Ordering::Less);
    }

    #[test]
    fn test_sort_naturally() {
        let mut ids = ["P10", "P1", "P2", "p3", "P21"].map(PatientId::from);
        sort_naturally(&mut ids);
        assert_eq!(ids, ["P1", "P2", "p3", "P10", "P21"].map(PatientId::from));
    }

    #[test]
    fn test_patient_id_serializes_as_plain_string() {
        let id = PatientId::from("HN-001");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"HN-001\"");
        let back: PatientId = serde_json::from_str("\"HN-001\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(id.to_string(), "HN-001");
    }
}
