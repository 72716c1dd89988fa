use std::path::PathBuf;

use anyhow::{Context as _, bail};
use radiomics_cohort::patient::{self, PatientId};
use radiomics_split::{
    assignment::PatientSet,
    controller::{SplitController, SplitSettings},
    state::TrainTestSplitType,
};

use crate::{command::split, model::split_record::SplitRecordFile};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TransferArg {
    /// Split state file
    state: PathBuf,
    /// Patients to move
    #[arg(required = true)]
    patients: Vec<String>,
    /// Set the patients are taken from: "training" or "test"
    #[arg(long)]
    from: PatientSet,
    /// Set the patients are moved to, the other set by default
    #[arg(long)]
    to: Option<PatientSet>,
}

pub(crate) fn run(arg: &TransferArg) -> anyhow::Result<()> {
    let TransferArg {
        state,
        patients,
        from,
        to,
    } = arg;
    let mut file = SplitRecordFile::open(state.clone())?;
    let current = file
        .record
        .state
        .assignment()?
        .with_context(|| format!("{} has no training/test split", state.display()))?;

    let requested = patient::unique_in_order(patients.iter().map(PatientId::new));
    let (moving, unknown): (Vec<_>, Vec<_>) = requested
        .into_iter()
        .partition(|id| current.side_of(id) == Some(*from));
    for id in &unknown {
        log::warn!("Patient {id} is not in {from}, skipping");
    }
    if moving.is_empty() {
        bail!("None of the given patients is in {from}");
    }

    let mut controller = SplitController::new(
        file.record.state.clone(),
        SplitSettings::default(),
        current.len(),
        rand::rng(),
    );
    if controller.state().train_test_split_type.is_auto() {
        log::info!("Switching to manual splitting before transferring patients");
        let pending = controller.set_train_test_split_type(TrainTestSplitType::Manual);
        controller.persist(&mut file, &pending)?;
    }

    let destination = to.unwrap_or_else(|| from.opposite());
    let pending = controller.transfer(&moving, *from, destination)?;
    controller.persist(&mut file, &pending)?;
    println!("Moved {} patients from {from} to {destination}", moving.len());
    println!();

    split::print_summary(controller.state(), current.len())
}
