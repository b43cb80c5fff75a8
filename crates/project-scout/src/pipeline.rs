/// Sequential run over one listing page.
///
/// The listing page is fetched first and a failure there ends the run. After that,
/// each project is fetched, extracted, scored and optionally summarized in listing
/// order. A failure on one project is logged and the run moves on to the next.
use std::path::PathBuf;

use tracing::{debug, info, warn};
use url::Url;

use scout_common::http::PageFetcher;

use crate::config::Config;
use crate::error::AppError;
use crate::extract::{DetailExtractor, ListingExtractor};
use crate::model::{ListingEntry, Project};
use crate::nlp::{KeywordExtractor, Summarizer};
use crate::output::ResultsWriter;
use crate::scorer::RelevanceScorer;
use crate::taxonomy::KeywordTaxonomy;

#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch(&self, url: &str) -> Result<String, AppError>;
}

impl PageSource for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        Ok(self.get_text(url).await?)
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries found on the listing page
    pub listed: usize,
    /// Rows written to the results file
    pub written: usize,
    /// Projects dropped because their page could not be fetched or extracted
    pub skipped: usize,
    /// Rows that carry a summary
    pub summarized: usize,
    pub output_path: PathBuf,
}

pub struct Pipeline<P, S, K> {
    pages: P,
    summarizer: S,
    keyword_extractor: K,
    listing_url: Url,
    listing: ListingExtractor,
    detail: DetailExtractor,
    scorer: RelevanceScorer,
    generate_keywords: bool,
    summarize: bool,
    summary_threshold: u8,
}

impl<P, S, K> Pipeline<P, S, K>
where
    P: PageSource,
    S: Summarizer,
    K: KeywordExtractor,
{
    pub fn new(
        config: &Config,
        taxonomy: &KeywordTaxonomy,
        pages: P,
        summarizer: S,
        keyword_extractor: K,
    ) -> Result<Self, AppError> {
        Ok(Self {
            pages,
            summarizer,
            keyword_extractor,
            listing_url: config.listing_url.clone(),
            listing: ListingExtractor::new(&config.extraction.listing)?,
            detail: DetailExtractor::new(&config.extraction.detail)?,
            scorer: RelevanceScorer::new(taxonomy, config.scorer.clone()),
            generate_keywords: config.generate_keywords,
            summarize: config.summarize,
            summary_threshold: config.summary_threshold,
        })
    }

    pub async fn run(&self, writer: &mut ResultsWriter) -> Result<RunSummary, AppError> {
        info!(url = %self.listing_url, "fetching listing page");
        let html = self.pages.fetch(self.listing_url.as_str()).await?;
        let entries = self.listing.extract(&html, &self.listing_url);
        if entries.is_empty() {
            warn!(url = %self.listing_url, "no projects found on listing page");
        } else {
            info!(projects = entries.len(), "projects found on listing page");
        }

        let mut summary = RunSummary {
            listed: entries.len(),
            written: 0,
            skipped: 0,
            summarized: 0,
            output_path: writer.path().to_path_buf(),
        };

        let total = entries.len();
        for (index, entry) in entries.into_iter().enumerate() {
            let link = entry.link.clone();
            info!(
                progress = %format!("{}/{total}", index + 1),
                title = %entry.title,
                "processing project"
            );
            match self.process(entry).await {
                Ok(project) => {
                    writer.write_project(&project)?;
                    summary.written += 1;
                    if project.summary.is_some() {
                        summary.summarized += 1;
                    }
                }
                Err(e) => {
                    warn!(link = %link, error = %e, "skipping project");
                    summary.skipped += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn process(&self, entry: ListingEntry) -> Result<Project, AppError> {
        let html = self.pages.fetch(&entry.link).await?;
        let description = self.detail.extract(&html)?;
        let mut project = Project::new(entry, description);
        self.analyze(&mut project).await;
        Ok(project)
    }

    /// Score the project and attach keywords and a summary where they apply.
    ///
    /// Model failures only cost the model's contribution: the project is still
    /// scored and written.
    async fn analyze(&self, project: &mut Project) {
        if project.description.trim().is_empty() {
            debug!(link = %project.link, "empty description, scoring 0");
            project.score = 0;
            return;
        }

        let model_keywords = if self.generate_keywords {
            match self.keyword_extractor.extract_keywords(&project.description).await {
                Ok(keywords) => {
                    debug!(link = %project.link, keywords = ?keywords, "keywords extracted");
                    Some(keywords)
                }
                Err(e) => {
                    warn!(link = %project.link, error = %e, "keyword extraction failed");
                    None
                }
            }
        } else {
            None
        };

        let report = self.scorer.score(&project.description, model_keywords.as_deref());
        for hit in &report.contributions {
            debug!(
                category = %hit.category,
                keyword = %hit.keyword,
                kind = ?hit.kind,
                source = ?hit.source,
                points = hit.points,
                "keyword hit"
            );
        }
        project.score = report.score;
        project.extracted_keywords = report.model_keywords;

        if self.summarize && project.score > self.summary_threshold {
            match self.summarizer.summarize(&project.description).await {
                Ok(text) if !text.trim().is_empty() => project.summary = Some(text),
                Ok(_) => warn!(link = %project.link, "summarizer returned nothing"),
                Err(e) => warn!(link = %project.link, error = %e, "summarization failed"),
            }
        }

        debug!(
            title = %project.title,
            raw = report.raw,
            score = project.score,
            relevance = %project.relevance(),
            summarized = project.summary.is_some(),
            "project analyzed"
        );
    }
}
