//! Load `.gaussparse.toml` from the working directory (CLI only). Library callers build
//! [`Opts`](crate::Opts) directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct SettingsToml {
    #[serde(default)]
    pub settings: SettingsSection,
}

/// Every key is optional; only keys present override the built-in defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsSection {
    pub pattern: Option<String>,
    pub output: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub separate: Option<bool>,
    pub jobs: Option<usize>,
    pub info_log: Option<PathBuf>,
    pub error_log: Option<PathBuf>,
    pub progress: Option<bool>,
}

/// Load the settings file from `dir` if present. Missing file → None; malformed file → warning, None.
pub fn load_settings_toml(dir: &Path) -> Option<SettingsToml> {
    let path = dir.join(PackagePaths::get().settings_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_settings(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_settings(s: &str) -> Result<SettingsToml, toml::de::Error> {
    toml::from_str(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_settings() {
        let s = parse_settings("[settings]\npattern = \"**/*.out\"\njobs = 3\n").unwrap();
        assert_eq!(s.settings.pattern.as_deref(), Some("**/*.out"));
        assert_eq!(s.settings.jobs, Some(3));
        assert!(s.settings.separate.is_none());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let s = parse_settings("").unwrap();
        assert!(s.settings.output.is_none());
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(parse_settings("[settings]\nbogus = 1\n").is_err());
    }
}
