use std::path::Path;

use ctxview_core::load_snapshot;

/// `ctxview kinds <FILE>`
pub fn execute(file: &Path, json: bool) -> anyhow::Result<()> {
    let snapshot = load_snapshot(file)?;
    let kinds = snapshot.kinds();

    if json {
        let rows: Vec<serde_json::Value> = kinds
            .iter()
            .map(|(kind, count)| serde_json::json!({ "kind": kind, "count": count }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if kinds.is_empty() {
        println!("(no kinds in trace)");
        return Ok(());
    }
    for (kind, count) in &kinds {
        println!("{:<24} {count}", kind.as_str());
    }
    println!("\n({} nodes total)", snapshot.node_count());
    Ok(())
}
