use thiserror::Error;

/// Failures that end a run after the request was attempted. The `Display`
/// text is what gets appended to the output after `[error] `.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Read(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StreamError {
    pub fn read(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StreamError::Read(Box::new(err))
    }
}
