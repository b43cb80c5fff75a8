/// Results CSV file.
///
/// The file is created, with its header, before any page is fetched, and every row is
/// flushed as soon as it is written so an interrupted run still leaves the projects
/// processed so far on disk.
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::AppError;
use crate::model::Project;

pub const RESULTS_HEADER: [&str; 5] = [
    "Title",
    "URL",
    "Relevance Score (out of 100)",
    "Keywords",
    "Summary",
];

const KEYWORD_SEPARATOR: &str = "; ";

pub struct ResultsWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl ResultsWriter {
    /// Create the output directory if needed and start a new results file in it.
    pub fn create(output_dir: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(output_dir)?;
        let path = results_path(output_dir, Local::now());
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(RESULTS_HEADER)?;
        writer.flush()?;
        Ok(Self { path, writer })
    }

    pub fn write_project(&mut self, project: &Project) -> Result<(), AppError> {
        let score = project.score.to_string();
        let keywords = project.extracted_keywords.join(KEYWORD_SEPARATOR);
        let summary = project.summary.as_deref().unwrap_or_default();
        self.writer.write_record([
            project.title.as_str(),
            project.link.as_str(),
            score.as_str(),
            keywords.as_str(),
            summary,
        ])?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `results.csv`, or a timestamped name when that file already exists.
pub fn results_path(output_dir: &Path, now: DateTime<Local>) -> PathBuf {
    let default = output_dir.join("results.csv");
    if !default.exists() {
        return default;
    }
    output_dir.join(format!("results_{}.csv", now.format("%d_%m_%Y_%H_%M_%S")))
}
