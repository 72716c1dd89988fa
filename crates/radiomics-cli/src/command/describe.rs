use std::{collections::BTreeSet, path::PathBuf};

use radiomics_cohort::{feature_table::FeatureKey, stats::FeatureStats};
use radiomics_filter::{path::FeaturePath, selection::SelectionSet};
use radiomics_split::state::DataSplittingType;
use serde::Serialize;

use crate::{
    command::dataset::{self, DatasetArg},
    model::split_record::SplitRecordFile,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DescribeArg {
    #[clap(flatten)]
    dataset: DatasetArg,
    /// Split state file; only training patients are summarized when split
    #[arg(long)]
    state: Option<PathBuf>,
    /// Selection file restricting the summarized features
    #[arg(long)]
    selection: Option<PathBuf>,
    /// Print the summary as JSON instead of a table
    #[arg(long)]
    json: bool,
    /// Save the summary as JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FeatureSummary<'a> {
    modality: &'a str,
    roi: &'a str,
    feature: &'a str,
    #[serde(flatten)]
    stats: &'a FeatureStats,
}

pub(crate) fn run(arg: &DescribeArg) -> anyhow::Result<()> {
    let dataset = arg.dataset.load()?;
    let record = arg
        .state
        .clone()
        .map(SplitRecordFile::open)
        .transpose()?
        .map(|file| file.record);

    let persisted = match &record {
        Some(record) if record.collection => record.state.assignment()?,
        _ => None,
    };
    let data_points = dataset.data_points(persisted.as_ref());

    // Test patients stay out of every summary.
    let patients = match &record {
        Some(record) if record.state.data_splitting_type == DataSplittingType::TrainTestSplit => {
            match record.state.assignment()? {
                Some(split) => split.training().to_vec(),
                None => {
                    log::warn!("No training/test split stored, summarizing all patients");
                    data_points
                }
            }
        }
        _ => data_points,
    };

    let selected = match &arg.selection {
        Some(path) => {
            let selection: SelectionSet = util::read_json_file("selection", path)?;
            let tree = dataset::feature_tree(&dataset.table)?;
            Some(selection.covered_leaves(&tree).cloned().collect::<BTreeSet<_>>())
        }
        None => None,
    };

    let summary = dataset.table.summarize(&patients);
    let mut rows = vec![];
    for (key, stats) in &summary {
        let wanted = match &selected {
            Some(selected) => selected.contains(&FeaturePath::new(key.segments())?),
            None => true,
        };
        if wanted {
            rows.push(summary_row(key, stats));
        }
    }

    if !arg.json {
        print_table(patients.len(), &rows);
    }
    if arg.json || arg.output.is_some() {
        let mut output = Output::from_output_path(arg.output.as_deref())?;
        output.write_json(&rows)?;
        log::info!("Wrote feature summary to {}", output.target());
    }
    Ok(())
}

fn print_table(patient_count: usize, rows: &[FeatureSummary<'_>]) {
    println!("Feature summary over {patient_count} patients");
    println!();
    println!(
        "{:<8} {:<12} {:<40} {:>5} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "Modality", "ROI", "Feature", "N", "Mean", "Std", "Min", "Median", "Max"
    );
    for row in rows {
        println!(
            "{:<8} {:<12} {:<40} {:>5} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            row.modality,
            row.roi,
            row.feature,
            row.stats.count,
            row.stats.mean,
            row.stats.std_dev,
            row.stats.min,
            row.stats.median,
            row.stats.max
        );
    }
}

fn summary_row<'a>(key: &'a FeatureKey, stats: &'a FeatureStats) -> FeatureSummary<'a> {
    FeatureSummary {
        modality: &key.modality,
        roi: &key.roi,
        feature: &key.feature,
        stats,
    }
}
