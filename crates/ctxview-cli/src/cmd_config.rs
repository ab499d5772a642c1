use clap::Subcommand;
use std::path::Path;

use crate::config::{self, ViewerConfig, KNOWN_KEYS};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (visible_kinds, all_kinds, expand_depth)
        key: String,
        /// Config value (true/false/number; comma-separated list for visible_kinds)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Print the config file path
    Path,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, config_path: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(config_path, &key, &value),
        ConfigCmd::Get { key } => get(config_path, &key),
        ConfigCmd::List => list(config_path),
        ConfigCmd::Path => {
            println!("{}", config_path.display());
            Ok(())
        }
    }
}

// ── Command Implementations ──

/// Parse a string value into JSON for the given key.
fn parse_value(key: &str, s: &str) -> serde_json::Value {
    if key == "visible_kinds" {
        let kinds: Vec<&str> = s
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();
        return serde_json::json!(kinds);
    }
    match s {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<u64>() {
                serde_json::Value::Number(n.into())
            } else {
                serde_json::Value::String(s.to_string())
            }
        }
    }
}

/// `ctxview config set <key> <value>`
pub fn set(config_path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    if !KNOWN_KEYS.contains(&key) {
        anyhow::bail!("unknown config key '{key}' (known: {})", KNOWN_KEYS.join(", "));
    }
    let mut map = config::read_map(config_path)?;
    map.insert(key.to_string(), parse_value(key, value));

    // Reject values that would make the file unloadable.
    serde_json::from_value::<ViewerConfig>(serde_json::Value::Object(map.clone()))
        .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}"))?;

    config::write_map(config_path, &map)?;
    println!("{key} = {}", map[key]);
    Ok(())
}

/// `ctxview config get <key>`
pub fn get(config_path: &Path, key: &str) -> anyhow::Result<()> {
    let map = config::read_map(config_path)?;
    match map.get(key) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `ctxview config list`
pub fn list(config_path: &Path) -> anyhow::Result<()> {
    let map = config::read_map(config_path)?;
    if map.is_empty() {
        println!("(no config set)");
    } else {
        for (k, v) in &map {
            println!("{k} = {v}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_by_key() {
        assert_eq!(
            parse_value("visible_kinds", "query, action,"),
            serde_json::json!(["query", "action"])
        );
        assert_eq!(parse_value("all_kinds", "true"), serde_json::json!(true));
        assert_eq!(parse_value("expand_depth", "3"), serde_json::json!(3));
        assert_eq!(parse_value("expand_depth", "x"), serde_json::json!("x"));
    }

    #[test]
    fn set_persists_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        set(&path, "expand_depth", "2").unwrap();
        set(&path, "visible_kinds", "query,observation").unwrap();
        let cfg = config::load(&path).unwrap();
        assert_eq!(cfg.expand_depth, 2);
        assert_eq!(cfg.visible_kinds, vec!["query", "observation"]);

        assert!(set(&path, "expand_depth", "deep").is_err());
        assert!(set(&path, "colour", "red").is_err());
        assert_eq!(config::load(&path).unwrap().expand_depth, 2);
    }
}
