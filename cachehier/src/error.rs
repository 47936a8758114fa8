/// Errors produced while building a cache hierarchy or reading its inputs
///
/// Once a [`Simulator`](crate::simulator::Simulator) has been constructed, probing the caches can
/// no longer fail; the only runtime error is a trace record which can't be decoded
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid geometry for cache {name:?}: {reason}")]
    InvalidGeometry { name: String, reason: String },

    #[error("a cache hierarchy needs at least one cache")]
    EmptyHierarchy,

    #[error("malformed trace record on line {line}: {reason}")]
    MalformedTraceEvent { line: u64, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn geometry(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
