use std::path::Path;

use ctxview_core::load_snapshot;

use crate::config::{self, ViewerConfig};

/// Open a trace interactively.
///
/// With the `tui` feature (default): opens the interactive ratatui viewer.
/// Without: prints the initially visible tree to stdout.
pub fn execute(file: &Path, config: &ViewerConfig) -> anyhow::Result<()> {
    let snapshot = load_snapshot(file)?;
    let state = config::initial_state(&snapshot, config);

    #[cfg(feature = "tui")]
    {
        crate::tui::run(file.to_path_buf(), snapshot, state)
    }

    #[cfg(not(feature = "tui"))]
    {
        eprintln!("ctxview tui (plain mode — rebuild with `tui` feature for interactive UI)");
        for visit in snapshot.walk(&state) {
            let indent = "  ".repeat(visit.depth);
            println!("{indent}{}", crate::render::header_line(&visit));
        }
        Ok(())
    }
}
