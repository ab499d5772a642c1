use std::path::PathBuf;

/// Errors raised while loading a trace snapshot.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The snapshot file could not be read.
    #[error("failed to read trace file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not a context node or an array of context nodes.
    #[error("invalid trace JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A node below the root is malformed. Names the parent and the
    /// child's position among its siblings.
    #[error("invalid child {index} of node `{parent}`: {source}")]
    InvalidChild {
        parent: String,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Two nodes in one snapshot share a uid. Expansion state is keyed by
    /// uid, so such a snapshot cannot be viewed unambiguously.
    #[error("duplicate node uid in snapshot: {0}")]
    DuplicateUid(String),
}
