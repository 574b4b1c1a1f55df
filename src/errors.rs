/// Domain-specific error types for the pairs analysis service.
/// `Numeric` and `Config` are server faults; the rest are caused by the
/// request or its data.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no data available for {0}")]
    UpstreamData(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("numeric error: {0}")]
    Numeric(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        AnalysisError::Network(e.to_string())
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
