//! Tabular radiomics features
//!
//! The feature table holds one row per (patient, modality, region of interest)
//! with every extracted feature as a numeric column:
//!
//! ```json
//! [
//!   {"PatientID": "P1", "Modality": "CT", "ROI": "GTV", "original_shape_Volume": 41.2},
//!   {"PatientID": "P1", "Modality": "PT", "ROI": "GTV", "original_firstorder_Mean": 3.1}
//! ]
//! ```
//!
//! Besides giving access to the rows, the table derives the cohort (unique
//! patients in first-seen order), the sorted metadata columns used for
//! filtering, and the `(modality, roi, feature)` triples that populate a
//! feature filter tree.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    patient::{self, PatientId},
    stats::FeatureStats,
};

/// One row of the feature table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(rename = "PatientID")]
    pub patient_id: PatientId,
    #[serde(rename = "Modality")]
    pub modality: String,
    #[serde(rename = "ROI")]
    pub roi: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
}

/// Distinct values of the metadata columns, each sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataColumns {
    pub modalities: Vec<String>,
    pub rois: Vec<String>,
    pub patients: Vec<PatientId>,
}

/// Location of a feature: imaging modality, region of interest and name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureKey {
    pub modality: String,
    pub roi: String,
    pub feature: String,
}

impl FeatureKey {
    #[must_use]
    pub fn segments(&self) -> [&str; 3] {
        [&self.modality, &self.roi, &self.feature]
    }
}

impl FeatureTable {
    #[must_use]
    pub fn new(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All patients that have at least one row, in first-seen order.
    #[must_use]
    pub fn all_patients(&self) -> Vec<PatientId> {
        patient::unique_in_order(self.rows.iter().map(|row| row.patient_id.clone()))
    }

    #[must_use]
    pub fn metadata_columns(&self) -> MetadataColumns {
        let modalities = self
            .rows
            .iter()
            .map(|row| row.modality.clone())
            .collect::<BTreeSet<_>>();
        let rois = self
            .rows
            .iter()
            .map(|row| row.roi.clone())
            .collect::<BTreeSet<_>>();
        let patients = self
            .rows
            .iter()
            .map(|row| row.patient_id.clone())
            .collect::<BTreeSet<_>>();

        MetadataColumns {
            modalities: modalities.into_iter().collect(),
            rois: rois.into_iter().collect(),
            patients: patients.into_iter().collect(),
        }
    }

    /// Every feature present in the table, sorted and without duplicates.
    #[must_use]
    pub fn feature_keys(&self) -> Vec<FeatureKey> {
        let keys = self
            .rows
            .iter()
            .flat_map(|row| {
                row.values.keys().map(|feature| FeatureKey {
                    modality: row.modality.clone(),
                    roi: row.roi.clone(),
                    feature: feature.clone(),
                })
            })
            .collect::<BTreeSet<_>>();
        keys.into_iter().collect()
    }

    /// Summarizes every feature over the rows of `patients` only.
    ///
    /// Features without any value for these patients are left out.
    #[must_use]
    pub fn summarize(&self, patients: &[PatientId]) -> BTreeMap<FeatureKey, FeatureStats> {
        let patients = patients.iter().collect::<HashSet<_>>();
        let mut values: BTreeMap<FeatureKey, Vec<f64>> = BTreeMap::new();

        for row in self
            .rows
            .iter()
            .filter(|row| patients.contains(&row.patient_id))
        {
            for (feature, value) in &row.values {
                let key = FeatureKey {
                    modality: row.modality.clone(),
                    roi: row.roi.clone(),
                    feature: feature.clone(),
                };
                values.entry(key).or_default().push(*value);
            }
        }

        values
            .into_iter()
            .filter_map(|(key, values)| FeatureStats::new(values).map(|stats| (key, stats)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"[
        {"PatientID": "P10", "Modality": "PT", "ROI": "GTV_N", "original_firstorder_Mean": 2.0},
        {"PatientID": "P2", "Modality": "CT", "ROI": "GTV_T", "original_shape_Volume": 10.0, "original_firstorder_Mean": 40.0},
        {"PatientID": "P10", "Modality": "CT", "ROI": "GTV_T", "original_shape_Volume": 30.0, "original_firstorder_Mean": 60.0},
        {"PatientID": "P1", "Modality": "CT", "ROI": "GTV_T", "original_shape_Volume": 20.0, "original_firstorder_Mean": 50.0}
    ]"#;

    fn table() -> FeatureTable {
        serde_json::from_str(TABLE).unwrap()
    }

    #[test]
    fn test_all_patients_first_seen_order() {
        let patients = table().all_patients();
        assert_eq!(patients, ["P10", "P2", "P1"].map(PatientId::from));
    }

    #[test]
    fn test_metadata_columns_sorted() {
        let columns = table().metadata_columns();
        assert_eq!(columns.modalities, ["CT", "PT"]);
        assert_eq!(columns.rois, ["GTV_N", "GTV_T"]);
        assert_eq!(columns.patients, ["P1", "P10", "P2"].map(PatientId::from));
    }

    #[test]
    fn test_feature_keys() {
        let keys = table().feature_keys();
        let keys = keys
            .iter()
            .map(|k| k.segments().join("/"))
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            [
                "CT/GTV_T/original_firstorder_Mean",
                "CT/GTV_T/original_shape_Volume",
                "PT/GTV_N/original_firstorder_Mean",
            ]
        );
    }

    #[test]
    fn test_summarize_only_given_patients() {
        let table = table();
        let summary = table.summarize(&["P1", "P2"].map(PatientId::from));
        assert_eq!(summary.len(), 2);

        let volume = &summary[&FeatureKey {
            modality: "CT".into(),
            roi: "GTV_T".into(),
            feature: "original_shape_Volume".into(),
        }];
        assert_eq!(volume.count, 2);
        assert_eq!(volume.min, 10.0);
        assert_eq!(volume.max, 20.0);
        assert_eq!(volume.mean, 15.0);
    }

    #[test]
    fn test_empty_table() {
        let table = FeatureTable::default();
        assert!(table.is_empty());
        assert!(table.all_patients().is_empty());
        assert!(table.feature_keys().is_empty());
        assert!(table.summarize(&[PatientId::from("P1")]).is_empty());
    }
}
