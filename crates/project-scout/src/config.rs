use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::AppError;
use crate::extract::ExtractionConfig;
use crate::scorer::ScorerSettings;

const DEFAULT_SUMMARY_THRESHOLD: u8 = 50;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SUMMARY_MODEL: &str = "pegasus-cnn-dailymail";
const DEFAULT_KEYWORD_MODEL: &str = "vlt5-base-keywords";

/// Run configuration, loaded explicitly from environment variables.
///
/// Everything here is validated before the first request is made.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listing page to enumerate projects from
    pub listing_url: Url,
    /// JSON keyword taxonomy
    pub taxonomy_path: PathBuf,
    /// Directory receiving the results CSV; created if absent
    pub output_dir: PathBuf,
    pub extraction: ExtractionConfig,
    /// Score with model-extracted keywords as well
    pub generate_keywords: bool,
    /// Summarize projects scoring above `summary_threshold`
    pub summarize: bool,
    pub summary_threshold: u8,
    pub verbose: bool,
    pub scorer: ScorerSettings,
    pub http_timeout: Duration,
    pub summary_model: String,
    pub keyword_model: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `SCOUT_LISTING_URL`: absolute http(s) URL of the listing page
    /// - `SCOUT_TAXONOMY_PATH`: path to the keyword taxonomy JSON
    /// - `SCOUT_OUTPUT_DIR`: directory for the results file
    ///
    /// Optional:
    /// - `SCOUT_EXTRACTION_PATH`: JSON listing mapping and detail layout
    /// - `SCOUT_GENERATE_KEYWORDS` (default false), `SCOUT_SUMMARIZE` (default true),
    ///   `SCOUT_VERBOSE` (default false)
    /// - `SCOUT_SUMMARY_THRESHOLD` (default 50), `SCOUT_SCORE_CEILING` (default 100)
    /// - `SCOUT_FUZZY_THRESHOLD` (default 0.8), `SCOUT_KEYWORD_FUZZY_THRESHOLD` (default 0.85)
    /// - `SCOUT_HTTP_TIMEOUT_SECS` (default 10)
    /// - `SCOUT_SUMMARY_MODEL`, `SCOUT_KEYWORD_MODEL`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| {
                AppError::Config(format!("{key} environment variable is required"))
            })
        };

        let listing_url = parse_listing_url(&required("SCOUT_LISTING_URL")?)?;

        let taxonomy_path = PathBuf::from(required("SCOUT_TAXONOMY_PATH")?);
        if !taxonomy_path.is_file() {
            return Err(AppError::Config(format!(
                "keyword taxonomy not found at {}",
                taxonomy_path.display()
            )));
        }

        let output_dir = PathBuf::from(required("SCOUT_OUTPUT_DIR")?);
        if output_dir.exists() && !output_dir.is_dir() {
            return Err(AppError::Config(format!(
                "output path {} is not a directory",
                output_dir.display()
            )));
        }

        let extraction = match var("SCOUT_EXTRACTION_PATH") {
            Some(path) => load_extraction(Path::new(&path))?,
            None => ExtractionConfig::default(),
        };

        let defaults = ScorerSettings::default();
        let scorer = ScorerSettings {
            fuzzy_threshold: parse_ratio(&var, "SCOUT_FUZZY_THRESHOLD", defaults.fuzzy_threshold)?,
            keyword_fuzzy_threshold: parse_ratio(
                &var,
                "SCOUT_KEYWORD_FUZZY_THRESHOLD",
                defaults.keyword_fuzzy_threshold,
            )?,
            score_ceiling: parse_or(&var, "SCOUT_SCORE_CEILING", defaults.score_ceiling)?,
        };
        if !scorer.score_ceiling.is_finite() || scorer.score_ceiling <= 0.0 {
            return Err(AppError::Config(format!(
                "SCOUT_SCORE_CEILING must be a positive number, got {}",
                scorer.score_ceiling
            )));
        }

        let summary_threshold =
            parse_or(&var, "SCOUT_SUMMARY_THRESHOLD", DEFAULT_SUMMARY_THRESHOLD)?;
        if summary_threshold > 100 {
            return Err(AppError::Config(format!(
                "SCOUT_SUMMARY_THRESHOLD must be within 0..=100, got {summary_threshold}"
            )));
        }

        let timeout_secs = parse_or(&var, "SCOUT_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(AppError::Config(
                "SCOUT_HTTP_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            listing_url,
            taxonomy_path,
            output_dir,
            extraction,
            generate_keywords: parse_flag(&var, "SCOUT_GENERATE_KEYWORDS", false)?,
            summarize: parse_flag(&var, "SCOUT_SUMMARIZE", true)?,
            summary_threshold,
            verbose: parse_flag(&var, "SCOUT_VERBOSE", false)?,
            scorer,
            http_timeout: Duration::from_secs(timeout_secs),
            summary_model: var("SCOUT_SUMMARY_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            keyword_model: var("SCOUT_KEYWORD_MODEL")
                .unwrap_or_else(|| DEFAULT_KEYWORD_MODEL.to_string()),
        })
    }

    /// Models the run will call, for the startup availability check.
    pub fn active_models(&self) -> Vec<&str> {
        let mut models = Vec::new();
        if self.summarize {
            models.push(self.summary_model.as_str());
        }
        if self.generate_keywords && !models.contains(&self.keyword_model.as_str()) {
            models.push(self.keyword_model.as_str());
        }
        models
    }
}

/// Read only the verbosity flag, so logging can be set up before the full load.
pub fn verbose_from_env() -> bool {
    std::env::var("SCOUT_VERBOSE")
        .ok()
        .and_then(|v| flag_value(&v))
        .unwrap_or(false)
}

fn parse_listing_url(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw)
        .map_err(|e| AppError::Config(format!("the given URL {raw} is invalid: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(AppError::Config(format!(
            "the given URL {raw} is not an absolute http(s) URL"
        ))),
    }
}

fn load_extraction(path: &Path) -> Result<ExtractionConfig, AppError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("failed to read extraction file {}: {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        AppError::Config(format!("invalid extraction file {}: {e}", path.display()))
    })
}

fn flag_value(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_flag(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool, AppError> {
    match var(key) {
        None => Ok(default),
        Some(raw) => flag_value(&raw)
            .ok_or_else(|| AppError::Config(format!("{key} must be a boolean, got '{raw}'"))),
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value '{raw}'"))),
    }
}

fn parse_ratio(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: f64,
) -> Result<f64, AppError> {
    let value: f64 = parse_or(var, key, default)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::Config(format!("{key} must be within 0..=1, got {value}")))
    }
}
