use std::path::PathBuf;

use anyhow::bail;
use radiomics_split::{
    controller::{DEFAULT_TRAINING_FRACTION, SplitController, SplitInputs, SplitSettings},
    state::{DataSplittingType, SplitState, TrainTestSplitType},
};

use crate::{command::dataset::DatasetArg, model::split_record::SplitRecordFile, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SplitArg {
    #[clap(flatten)]
    dataset: DatasetArg,
    /// Split state file, created if missing
    #[arg(long)]
    state: PathBuf,
    /// Data splitting type: "full" or "split"
    #[arg(long)]
    mode: Option<DataSplittingType>,
    /// How the split is maintained: "auto" or "manual"
    #[arg(long)]
    split_type: Option<TrainTestSplitType>,
    /// Requested number of training patients
    #[arg(long)]
    training_count: Option<usize>,
    /// Default share of training patients when no count is requested
    #[arg(long, default_value_t = DEFAULT_TRAINING_FRACTION)]
    training_fraction: f64,
    /// Mark the state as belonging to a collection
    #[arg(long)]
    collection: bool,
    /// Seed for a reproducible split
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &SplitArg) -> anyhow::Result<()> {
    let SplitArg {
        dataset,
        state,
        mode,
        split_type,
        training_count,
        training_fraction,
        collection,
        seed,
    } = arg;
    if !(0.0..=1.0).contains(training_fraction) {
        bail!("Training fraction must be between 0 and 1, got {training_fraction}");
    }

    let dataset = dataset.load()?;
    let mut file = SplitRecordFile::open_or_default(state.clone())?;
    file.record.collection |= *collection;

    let persisted = if file.record.collection {
        file.record.state.assignment()?
    } else {
        None
    };
    let data_points = dataset.data_points(persisted.as_ref());
    let inputs = SplitInputs::new(&data_points, dataset.category.as_ref());

    let settings = SplitSettings {
        default_training_fraction: *training_fraction,
    };
    let mut controller = SplitController::new(
        file.record.state.clone(),
        settings,
        data_points.len(),
        util::rng_from_seed(*seed),
    );

    if let Some(pending) = controller.sync(&inputs) {
        controller.persist(&mut file, &pending)?;
    }
    if let Some(mode) = mode.filter(|m| *m != controller.state().data_splitting_type) {
        let pending = controller.set_data_splitting_type(mode, &inputs);
        controller.persist(&mut file, &pending)?;
    }
    if let Some(split_type) =
        split_type.filter(|t| *t != controller.state().train_test_split_type)
    {
        let pending = controller.set_train_test_split_type(split_type);
        controller.persist(&mut file, &pending)?;
    }
    if let Some(count) = *training_count {
        if count > data_points.len() {
            log::warn!(
                "Requested {count} training patients but only {} are available",
                data_points.len()
            );
        }
        match controller.set_requested_training_count(count, &inputs) {
            Some(pending) => {
                controller.persist(&mut file, &pending)?;
            }
            None => log::warn!("Training count only applies to an automatic train/test split"),
        }
    }

    if controller.state().data_splitting_type.is_train_test_split()
        && !controller.state().has_split()
    {
        log::warn!("No split could be computed; a label category with labelled patients is required");
    }

    print_summary(controller.state(), data_points.len())
}

/// Prints the splitting mode and, if present, both patient sets.
pub(crate) fn print_summary(state: &SplitState, data_points: usize) -> anyhow::Result<()> {
    match state.data_splitting_type {
        DataSplittingType::FullDataset => {
            println!("Data splitting: {}", state.data_splitting_type);
            println!("All {data_points} patients are used for cross-validation");
        }
        DataSplittingType::TrainTestSplit => {
            println!(
                "Data splitting: {} ({})",
                state.data_splitting_type, state.train_test_split_type
            );
            let Some(split) = state.assignment()? else {
                println!("No training/test split stored");
                return Ok(());
            };
            let (training_pct, test_pct) = split.percentages();
            println!();
            util::print_patients(&format!("Training set: {training_pct}%"), split.training());
            println!();
            util::print_patients(&format!("Test set: {test_pct}%"), split.test());
        }
    }
    Ok(())
}
