/// Core error type for the digest bot.
///
/// Adapter crates map their specific errors into this type so the pipeline
/// can tell isolated failures (feed, store) from cycle-aborting ones (delivery).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feed error: {url}: {reason}")]
    Feed { url: String, reason: String },

    #[error("store error: {0}")]
    Store(String),

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("a digest run is already in progress")]
    Busy,

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn feed(url: &str, reason: impl Into<String>) -> Self {
        Self::Feed {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
