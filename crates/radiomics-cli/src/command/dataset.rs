//! Inputs shared by the dataset commands

use std::path::PathBuf;

use anyhow::Context;
use radiomics_cohort::{
    feature_table::{FeatureKey, FeatureTable},
    label::LabelCategory,
    patient::PatientId,
};
use radiomics_filter::tree::FilterTree;
use radiomics_split::{assignment::SplitAssignment, controller};

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DatasetArg {
    /// Path to the feature table JSON file
    pub features: PathBuf,
    /// Path to the label category JSON file used for stratification
    #[arg(long)]
    pub labels: Option<PathBuf>,
}

#[derive(Debug)]
pub(crate) struct Dataset {
    pub table: FeatureTable,
    pub category: Option<LabelCategory>,
}

impl DatasetArg {
    pub(crate) fn load(&self) -> anyhow::Result<Dataset> {
        let table = util::read_feature_table(&self.features)?;
        let category = self
            .labels
            .as_ref()
            .map(util::read_label_category)
            .transpose()?;
        Ok(Dataset { table, category })
    }
}

impl Dataset {
    /// Patients offered to the splitter.
    ///
    /// `persisted` is the split stored on a collection, if any.
    pub(crate) fn data_points(&self, persisted: Option<&SplitAssignment>) -> Vec<PatientId> {
        let all_patients = self.table.all_patients();
        if let Some(category) = &self.category {
            let unlabelled = category.unlabelled_patients(&all_patients);
            if !unlabelled.is_empty() {
                log::warn!(
                    "{} of {} patients have no usable '{}' label and are left out",
                    unlabelled.len(),
                    all_patients.len(),
                    category.name
                );
            }
        }
        controller::resolve_data_points(&all_patients, self.category.as_ref(), persisted)
    }
}

/// Builds the modality → ROI → feature tree of `table`.
pub(crate) fn feature_tree(table: &FeatureTable) -> anyhow::Result<FilterTree> {
    FilterTree::from_segments(table.feature_keys().iter().map(FeatureKey::segments))
        .context("Failed to build the feature tree")
}
