use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use radiomics_cohort::{
    feature_table::FeatureTable,
    label::LabelCategory,
    patient::{self, PatientId},
};
use rand::{RngCore, SeedableRng as _};
use rand_pcg::Pcg32;

/// Destination of JSON written by a command: a file, or stdout when no path is given.
#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    /// Writes `value` as pretty JSON to `path`, or to stdout if `path` is `None`.
    pub fn save_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
    where
        T: serde::Serialize + ?Sized,
    {
        let mut output = Output::from_output_path(path)?;
        output.write_json(value)
    }

    pub fn from_output_path(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Output::Stdout {
                writer: io::stdout().lock(),
            });
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path: path.to_owned(),
        })
    }

    /// Where the output goes, for messages.
    #[must_use]
    pub fn target(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_owned(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize + ?Sized,
    {
        serde_json::to_writer_pretty(&mut *self, value)
            .with_context(|| format!("Failed to write JSON to {}", self.target()))?;
        writeln!(self)
            .and_then(|()| self.flush())
            .with_context(|| format!("Failed to finish writing {}", self.target()))
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read a feature table from a JSON file
///
/// The file holds an array of rows with `PatientID`, `Modality`, `ROI` and one
/// numeric column per feature.
pub fn read_feature_table<P>(path: P) -> anyhow::Result<FeatureTable>
where
    P: AsRef<Path>,
{
    let table: FeatureTable = read_json_file("feature table", &path)?;
    if table.is_empty() {
        log::warn!("Feature table {} has no rows", path.as_ref().display());
    }
    Ok(table)
}

/// Read a label category from a JSON file
///
/// # Errors
///
/// Returns error if the file cannot be parsed or labels a patient twice
pub fn read_label_category<P>(path: P) -> anyhow::Result<LabelCategory>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let category: LabelCategory = read_json_file("label category", path)?;
    category
        .validate()
        .with_context(|| format!("Invalid label category file: {}", path.display()))?;
    Ok(category)
}

/// Random source for splitting, reproducible when `seed` is given.
pub fn rng_from_seed(seed: Option<u64>) -> Box<dyn RngCore> {
    match seed {
        Some(seed) => Box::new(Pcg32::seed_from_u64(seed)),
        None => Box::new(rand::rng()),
    }
}

/// Prints patients in natural order, ten per line.
pub fn print_patients(title: &str, patients: &[PatientId]) {
    let mut sorted = patients.to_vec();
    patient::sort_naturally(&mut sorted);
    println!("{title} ({} patients)", sorted.len());
    for chunk in sorted.chunks(10) {
        let line = chunk
            .iter()
            .map(PatientId::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_without_path_is_stdout() {
        let output = Output::from_output_path(None).unwrap();
        assert!(matches!(output, Output::Stdout { .. }));
        assert_eq!(output.target(), "stdout");
    }

    #[test]
    fn test_save_json_to_file() {
        let path = std::env::temp_dir().join(format!(
            "radiomics-output-{}.json",
            std::process::id()
        ));
        Output::save_json(&["P1", "P2"], Some(path.as_path())).unwrap();
        let saved: Vec<String> = read_json_file("test", &path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(saved, ["P1", "P2"]);
    }
}
