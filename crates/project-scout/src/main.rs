mod config;
mod error;
mod extract;
mod matching;
mod model;
mod nlp;
mod output;
mod pipeline;
mod scorer;
mod taxonomy;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use scout_common::http::PageFetcher;
use scout_common::openai::{EndpointConfig, ModelEndpoint};

use config::Config;
use nlp::{ChatKeywordExtractor, ChatSummarizer};
use output::ResultsWriter;
use pipeline::Pipeline;
use taxonomy::KeywordTaxonomy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = if config::verbose_from_env() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting project-scout");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        listing_url = %config.listing_url,
        taxonomy = %config.taxonomy_path.display(),
        output_dir = %config.output_dir.display(),
        generate_keywords = config.generate_keywords,
        summarize = config.summarize,
        verbose = config.verbose,
        "configuration loaded"
    );

    // 2. Keyword taxonomy
    let taxonomy = KeywordTaxonomy::load(&config.taxonomy_path)?;
    info!(
        categories = taxonomy.categories().len(),
        keywords = taxonomy.keyword_count(),
        "taxonomy loaded"
    );

    // 3. Results file, before anything touches the network
    let mut writer = ResultsWriter::create(&config.output_dir)?;
    info!(path = %writer.path().display(), "results file created");

    // 4. HTTP and model clients
    let pages = PageFetcher::new(config.http_timeout)?;
    let endpoint = Arc::new(ModelEndpoint::new(EndpointConfig::from_env())?);
    let summarizer = ChatSummarizer::new(Arc::clone(&endpoint), &config.summary_model);
    let keyword_extractor = ChatKeywordExtractor::new(Arc::clone(&endpoint), &config.keyword_model);

    let pipeline = Pipeline::new(&config, &taxonomy, pages, summarizer, keyword_extractor)?;

    let models = config.active_models();
    if !models.is_empty() {
        nlp::check_models(&endpoint, &models).await;
    }

    // 5. Run
    let summary = pipeline.run(&mut writer).await?;
    info!(
        listed = summary.listed,
        written = summary.written,
        skipped = summary.skipped,
        summarized = summary.summarized,
        path = %summary.output_path.display(),
        "run complete"
    );

    Ok(())
}
