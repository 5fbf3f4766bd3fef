//! `taxtree.conf` — plain `key = value` lines, `#` comments.
//!
//! Unknown keys are ignored so newer files keep working with older builds.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const CONFIG_FILE: &str = "taxtree.conf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Default every animation to the slow-motion duration.
    pub slow_motion: bool,
    /// Show the hover tooltip panel.
    pub show_tooltip: bool,
    /// Apply the shallow-depth label truncation policy.
    pub truncate_labels: bool,
    /// Sibling-axis spacing between adjacent leaves.
    pub leaf_spacing: u16,
    /// Depth-axis spacing between levels.
    pub level_spacing: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            slow_motion: false,
            show_tooltip: true,
            truncate_labels: true,
            leaf_spacing: 3,
            level_spacing: 24,
        }
    }
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

pub fn parse(text: &str) -> Result<Config> {
    let mut config = Config::default();
    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .with_context(|| format!("line {}: expected `key = value`", line_no + 1))?;
        let key = key.trim();
        let value = value.trim();
        match key {
            "slow_motion" => config.slow_motion = parse_bool(key, value, line_no)?,
            "show_tooltip" => config.show_tooltip = parse_bool(key, value, line_no)?,
            "truncate_labels" => config.truncate_labels = parse_bool(key, value, line_no)?,
            "leaf_spacing" => config.leaf_spacing = parse_u16(key, value, line_no)?,
            "level_spacing" => config.level_spacing = parse_u16(key, value, line_no)?,
            _ => {}
        }
    }
    Ok(config)
}

pub fn serialize(config: &Config) -> String {
    format!(
        "# taxtree viewer settings\n\
         slow_motion = {}\n\
         show_tooltip = {}\n\
         truncate_labels = {}\n\
         leaf_spacing = {}\n\
         level_spacing = {}\n",
        config.slow_motion,
        config.show_tooltip,
        config.truncate_labels,
        config.leaf_spacing,
        config.level_spacing,
    )
}

fn parse_bool(key: &str, value: &str, line_no: usize) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => anyhow::bail!(
            "line {}: {} must be true or false, got {:?}",
            line_no + 1,
            key,
            other
        ),
    }
}

fn parse_u16(key: &str, value: &str, line_no: usize) -> Result<u16> {
    value
        .parse::<u16>()
        .with_context(|| format!("line {}: {} must be a number", line_no + 1, key))
}
