use clap::{Parser, Subcommand};

use self::{
    describe::DescribeArg, split::SplitArg, transfer::TransferArg, tree::TreeArg,
    unlabelled::UnlabelledArg,
};

mod dataset;
mod describe;
mod split;
mod transfer;
mod tree;
mod unlabelled;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Choose between the full dataset and a training/test split, and keep the split up to date
    Split(#[clap(flatten)] SplitArg),
    /// Move patients between the training and test sets
    Transfer(#[clap(flatten)] TransferArg),
    /// List patients without a usable outcome label
    Unlabelled(#[clap(flatten)] UnlabelledArg),
    /// Show the feature filter tree and edit the feature selection
    Tree(#[clap(flatten)] TreeArg),
    /// Summarize features over the training patients
    Describe(#[clap(flatten)] DescribeArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Split(arg) => split::run(&arg)?,
        Mode::Transfer(arg) => transfer::run(&arg)?,
        Mode::Unlabelled(arg) => unlabelled::run(&arg)?,
        Mode::Tree(arg) => tree::run(&arg)?,
        Mode::Describe(arg) => describe::run(&arg)?,
    }
    Ok(())
}
