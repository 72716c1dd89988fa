use std::path::PathBuf;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct UnlabelledArg {
    /// Path to the feature table JSON file
    features: PathBuf,
    /// Path to the label category JSON file
    #[arg(long)]
    labels: PathBuf,
}

pub(crate) fn run(arg: &UnlabelledArg) -> anyhow::Result<()> {
    let table = util::read_feature_table(&arg.features)?;
    let category = util::read_label_category(&arg.labels)?;
    let all_patients = table.all_patients();
    let unlabelled = category.unlabelled_patients(&all_patients);

    println!(
        "Label category '{}' ({}, outcome columns: {})",
        category.name,
        category.label_type,
        category.label_type.outcome_columns().join(", ")
    );
    if unlabelled.is_empty() {
        println!("All {} patients are labelled", all_patients.len());
        return Ok(());
    }
    util::print_patients(
        "Unlabelled patients, excluded from training and test sets",
        &unlabelled,
    );
    Ok(())
}
