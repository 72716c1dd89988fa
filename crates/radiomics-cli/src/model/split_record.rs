use std::path::PathBuf;

use chrono::{DateTime, Utc};
use radiomics_split::{
    controller::SplitBackend,
    state::{SplitState, SplitUpdate},
};
use serde::{Deserialize, Serialize};

use crate::util::{self, Output};

/// Splitting fields of one extraction or collection, as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitRecord {
    /// Whether the record belongs to a collection, whose split defines its patients
    #[serde(default)]
    pub collection: bool,
    /// Timestamp of the last saved update (ISO 8601 format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub state: SplitState,
}

/// A split record backed by a JSON file.
///
/// Every update is applied to the record and the whole file is rewritten.
#[derive(Debug)]
pub struct SplitRecordFile {
    path: PathBuf,
    pub record: SplitRecord,
}

impl SplitRecordFile {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let record = util::read_json_file("split state", &path)?;
        Ok(Self { path, record })
    }

    /// Opens `path`, or starts from an empty record if it does not exist yet.
    pub fn open_or_default(path: PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            return Self::open(path);
        }
        log::info!("Split state file {} not found, starting a new one", path.display());
        Ok(Self {
            path,
            record: SplitRecord::default(),
        })
    }
}

impl SplitBackend for SplitRecordFile {
    type Error = anyhow::Error;

    fn update(&mut self, update: &SplitUpdate) -> anyhow::Result<()> {
        let mut record = self.record.clone();
        record.state.apply(update);
        record.saved_at = Some(Utc::now());
        Output::save_json(&record, Some(self.path.as_path()))?;
        log::info!("Saved split state to {}", self.path.display());
        self.record = record;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use radiomics_cohort::patient::PatientId;
    use radiomics_split::{
        assignment::SplitAssignment,
        state::{DataSplittingType, TrainTestSplitType},
    };

    use super::*;

    #[test]
    fn test_record_flattens_state() {
        let record: SplitRecord = serde_json::from_value(serde_json::json!({
            "collection": true,
            "data_splitting_type": "TRAIN_TEST_SPLIT",
            "train_test_split_type": "MANUAL",
            "training_patients": ["P1"],
            "test_patients": ["P2"],
        }))
        .unwrap();
        assert!(record.collection);
        assert_eq!(record.saved_at, None);
        assert_eq!(
            record.state.data_splitting_type,
            DataSplittingType::TrainTestSplit
        );
        assert_eq!(record.state.train_test_split_type, TrainTestSplitType::Manual);
        assert!(record.state.has_split());
    }

    #[test]
    fn test_file_backend_rewrites_record() {
        let path = std::env::temp_dir().join(format!(
            "radiomics-split-record-{}.json",
            std::process::id()
        ));
        let mut file = SplitRecordFile::open_or_default(path.clone()).unwrap();
        assert_eq!(file.record, SplitRecord::default());

        let split = SplitAssignment::new(
            vec![PatientId::from("P1"), PatientId::from("P2")],
            vec![PatientId::from("P3")],
        )
        .unwrap();
        file.update(&SplitUpdate::patients(Some(split))).unwrap();
        assert!(file.record.saved_at.is_some());

        let reopened = SplitRecordFile::open(path.clone()).unwrap();
        assert_eq!(reopened.record, file.record);
        assert_eq!(
            reopened.record.state.training_patients.as_deref().map(<[_]>::len),
            Some(2)
        );
        std::fs::remove_file(path).unwrap();
    }
}
