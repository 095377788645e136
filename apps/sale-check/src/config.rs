//! sale-check configuration module.
//!
//! Rules come from an optional TOML file, then `ICO_*` environment
//! variables, with fallback to defaults.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ico_core::SaleRules;

/// Load rules from `path` (if any), then apply the process environment.
pub fn load_rules(path: Option<&Path>) -> Result<SaleRules> {
    load_rules_with(path, |key| env::var(key).ok())
}

/// File rules first, then overrides from `lookup`.
fn load_rules_with<F>(path: Option<&Path>, lookup: F) -> Result<SaleRules>
where
    F: Fn(&str) -> Option<String>,
{
    let rules = match path {
        Some(path) => {
            let doc = fs::read_to_string(path)
                .with_context(|| format!("reading rules file {}", path.display()))?;
            SaleRules::from_toml_str(&doc)
                .with_context(|| format!("loading rules from {}", path.display()))?
        }
        None => SaleRules::default(),
    };

    rules
        .with_overrides(lookup)
        .context("applying ICO_* environment overrides")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ico_core::ContiguityOrder;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn rules_file(name: &str, body: &str) -> PathBuf {
        let file = format!("sale-check-{}-{}.toml", name, std::process::id());
        let path = env::temp_dir().join(file);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_missing_rules_file_is_an_error() {
        let err = load_rules_with(Some(Path::new("/nonexistent/rules.toml")), no_env).unwrap_err();
        assert!(format!("{:#}", err).contains("reading rules file"));
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        assert_eq!(load_rules_with(None, no_env).unwrap(), SaleRules::default());
    }

    #[test]
    fn test_env_overrides_rules_file() {
        let path = rules_file(
            "precedence",
            "percent_epsilon = 0.001\ncontiguity = \"chronological\"\n",
        );
        let rules = load_rules_with(Some(&path), |key| {
            (key == "ICO_CONTIGUITY").then(|| "submission".to_string())
        })
        .unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(rules.percent_epsilon, 0.001);
        assert_eq!(rules.contiguity, ContiguityOrder::Submission);
    }

    #[test]
    fn test_bad_rules_file_and_bad_env_are_errors() {
        let path = rules_file("bad", "percent_epsilon = \"wide\"\n");
        let result = load_rules_with(Some(&path), no_env);
        fs::remove_file(&path).ok();
        assert!(result.is_err());

        let result = load_rules_with(None, |key| {
            (key == "ICO_INPUT_UTC_OFFSET").then(|| "+-1:00".to_string())
        });
        assert!(result.is_err());
    }
}
