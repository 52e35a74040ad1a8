//! Engine configuration for the CLI
//!
//! Options come from an optional YAML file and are then overridden by
//! command-line flags.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tally_formula::{CaseFallback, EngineOptions};

/// Flag values that take precedence over the config file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub max_nesting_depth: Option<usize>,
    pub max_records: Option<usize>,
    pub case_fallback: Option<CaseFallback>,
    pub no_cache: bool,
}

pub fn load_options(path: Option<&Path>, overrides: &Overrides) -> Result<EngineOptions> {
    let mut options = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            parse_options(&text)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => EngineOptions::default(),
    };

    if let Some(depth) = overrides.max_nesting_depth {
        options.max_nesting_depth = depth;
    }
    if let Some(limit) = overrides.max_records {
        options.max_records = Some(limit);
    }
    if let Some(fallback) = overrides.case_fallback {
        options.case_fallback = fallback;
    }
    if overrides.no_cache {
        options.cache_capacity = 0;
    }

    tracing::debug!(?options, "engine options");
    Ok(options)
}

fn parse_options(text: &str) -> Result<EngineOptions> {
    // An empty file means defaults
    if text.trim().is_empty() {
        return Ok(EngineOptions::default());
    }
    Ok(serde_yaml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_options() {
        let options = parse_options("max_nesting_depth: 4\ncase_fallback: null_value\n");
        assert!(options.is_err());

        let options = parse_options("max_nesting_depth: 4\nmax_records: 1000\ncase_fallback: \"null\"\n").unwrap();
        assert_eq!(options.max_nesting_depth, 4);
        assert_eq!(options.max_records, Some(1000));
        assert_eq!(options.case_fallback, CaseFallback::Null);
        assert_eq!(options.cache_capacity, 256);
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse_options("\n").unwrap(), EngineOptions::default());
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            max_nesting_depth: Some(3),
            no_cache: true,
            ..Overrides::default()
        };
        let options = load_options(None, &overrides).unwrap();
        assert_eq!(options.max_nesting_depth, 3);
        assert_eq!(options.cache_capacity, 0);
    }
}
