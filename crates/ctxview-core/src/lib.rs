mod decode;
pub mod error;
pub mod expansion;
pub mod node;
pub mod snapshot;
pub mod types;
pub mod walker;

pub use error::TraceError;
pub use expansion::{ExpansionState, Selection, SetOpen};
pub use snapshot::{load_snapshot, parse_snapshot, Snapshot};
pub use types::*;
pub use walker::{walk, walk_forest, Visit, Walker};
