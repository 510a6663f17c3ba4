use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No content body found on {0}")]
    MissingContent(String),

    #[error("Random page did not resolve to an article: {0}")]
    NoRandomPage(String),
}

impl FetchError {
    /// True when the page arrived but its main content could not be extracted.
    pub fn is_extraction(&self) -> bool {
        matches!(self, FetchError::MissingContent(_))
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
