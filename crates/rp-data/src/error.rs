use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to fetch `{resource}`: {source}")]
    Fetch {
        resource: String,
        #[source]
        source:   std::io::Error,
    },

    #[error("malformed chunk `{resource}`: {reason}")]
    MalformedChunk { resource: String, reason: String },

    #[error("malformed manifest: {0}")]
    MalformedManifest(String),
}

pub type DataResult<T> = Result<T, DataError>;
