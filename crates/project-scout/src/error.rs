use scout_common::error::CommonError;
use scout_common::openai::EndpointError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("config error: {0}")]
    Config(String),

    #[error("taxonomy error: {0}")]
    Taxonomy(String),

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("model error: {0}")]
    Model(#[from] EndpointError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
