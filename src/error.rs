use thiserror::Error;

/// Failures raised by the GitHub transport.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("github API request failed: status={status} body={body}")]
    Status { status: u16, body: String },
    #[error("error decoding response body for {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("graphql query returned errors: {}", messages.join("; "))]
    GraphQl { messages: Vec<String> },
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("{0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("{operation} failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: ApiError,
    },
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl StatsError {
    pub fn transport(operation: impl Into<String>, source: ApiError) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
