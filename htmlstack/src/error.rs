use std::io;
use std::string::FromUtf8Error;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template has {literals} literal segments for {values} values, expected {}", .values + 1)]
    SegmentCount { literals: usize, values: usize },

    #[error("pending value at position {position} failed: {source}")]
    Resolve {
        position: usize,
        #[source]
        source: BoxError,
    },

    #[error("stream at position {position} is not valid UTF-8: {source}")]
    Utf8 {
        position: usize,
        #[source]
        source: FromUtf8Error,
    },

    #[error("nested fragment at position {position} failed: {source}")]
    Nested {
        position: usize,
        #[source]
        source: Box<RenderError>,
    },

    #[error("writing to the sink failed: {0}")]
    Sink(#[from] io::Error),
}

impl RenderError {
    /// The template position of the value that failed, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            RenderError::Resolve { position, .. }
            | RenderError::Utf8 { position, .. }
            | RenderError::Nested { position, .. } => Some(*position),
            RenderError::SegmentCount { .. } | RenderError::Sink(_) => None,
        }
    }
}
