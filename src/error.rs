pub type QuotepressResult<T> = Result<T, QuotepressError>;

#[derive(thiserror::Error, Debug)]
pub enum QuotepressError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("no element with insertion id '{0}' in page content")]
    MarkerNotFound(String),

    #[error("markup error: {0}")]
    Markup(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("wordpress api error: {0}")]
    Api(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QuotepressError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn markup(msg: impl Into<String>) -> Self {
        Self::Markup(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }
}
