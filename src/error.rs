use thiserror::Error;

/// Every way the core (object store, ref store, pack protocol, and delta
/// resolver) can fail. The CLI layer wraps these in `anyhow::Context` rather
/// than matching on them, but keeping a closed taxonomy here makes each
/// failure mode testable in isolation.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("object or ref not found: {0}")]
    NotFound(String),

    #[error("corrupt object: {0}")]
    Corrupt(String),

    #[error("unsupported object: {0}")]
    UnsupportedObject(String),

    #[error("malformed pack: {0}")]
    MalformedPack(String),

    #[error("malformed delta: {0}")]
    MalformedDelta(String),

    #[error("pack finished with {0} unresolved delta(s)")]
    UnresolvedDeltas(usize),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("remote error: {0}")]
    RemoteError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("usage error: {0}")]
    UsageError(String),
}

pub type Result<T> = std::result::Result<T, GitError>;
