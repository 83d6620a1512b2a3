//! Configuration helpers shared by Vantage services.
//!
//! Each binary loads its own section (in priority order):
//! 1. Environment variables (`VANTAGE_<SECTION>__<KEY>`)
//! 2. Config file (`vantage.toml`, `[<section>]` table)
//! 3. Defaults
//!
//! A missing section falls back to defaults. A section that is present but
//! malformed is an error, never silently replaced.

use std::path::PathBuf;

use ::config::builder::DefaultState;
use ::config::{ConfigBuilder, ConfigError, Environment, File};
use serde::de::DeserializeOwned;

use crate::error::{CoreError, Result};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "VANTAGE";

/// Name of the per-user data directory under `$HOME`.
pub const DATA_DIR_NAME: &str = ".vantage";

/// Default module metadata location, relative to `$HOME`.
pub const DEFAULT_CATALOG_PATH: &str = "~/.msf4/store/modules_metadata.json";

/// `$HOME/.vantage`.
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .ok_or(CoreError::NoHomeDir)
}

/// Expand a leading `~/` (or a bare `~`) to the user's home directory.
/// Other paths are returned unchanged.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return dirs::home_dir().ok_or(CoreError::NoHomeDir);
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .ok_or(CoreError::NoHomeDir),
        None => Ok(PathBuf::from(path)),
    }
}

/// Environment source mapping `VANTAGE_EXPLOIT__MAX_RESULTS` to
/// `exploit.max_results`.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Builder with the optional `{file_prefix}.toml` (or any other supported
/// extension) as its only source.
pub fn file_builder(file_prefix: &str) -> ConfigBuilder<DefaultState> {
    ::config::Config::builder().add_source(File::with_name(file_prefix).required(false))
}

/// Build `builder` and deserialize `section` from it.
pub fn load_section<T>(builder: ConfigBuilder<DefaultState>, section: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let cfg = builder.build()?;
    match cfg.get::<T>(section) {
        Ok(value) => Ok(value),
        Err(ConfigError::NotFound(_)) => {
            tracing::debug!(section, "No config section found, using defaults");
            Ok(T::default())
        }
        Err(e) => Err(CoreError::Config(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_untouched() {
        assert_eq!(
            expand_home("/opt/catalog.json").unwrap(),
            PathBuf::from("/opt/catalog.json")
        );
        assert_eq!(expand_home("relative/x").unwrap(), PathBuf::from("relative/x"));
    }

    #[test]
    fn tilde_expands_under_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(
            expand_home("~/.msf4/store/modules_metadata.json").unwrap(),
            home.join(".msf4/store/modules_metadata.json")
        );
        assert_eq!(default_data_dir().unwrap(), home.join(DATA_DIR_NAME));
    }

    #[derive(Debug, Default, serde::Deserialize, PartialEq)]
    struct Section {
        #[serde(default)]
        limit: usize,
        #[serde(default)]
        name: String,
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    fn toml(content: &str) -> File<::config::FileSourceString, ::config::FileFormat> {
        File::from_str(content, ::config::FileFormat::Toml)
    }

    #[test]
    fn missing_section_uses_defaults() {
        let builder = ::config::Config::builder()
            .add_source(toml("[other]\nlimit = 3"))
            .add_source(env(&[]));
        let section: Section = load_section(builder, "sample").unwrap();
        assert_eq!(section, Section::default());
    }

    #[test]
    fn malformed_section_is_an_error() {
        let builder = ::config::Config::builder()
            .add_source(toml("[sample]\nname = \"x\"\nlimit = \"many\""))
            .add_source(env(&[]));
        let result: Result<Section> = load_section(builder, "sample");
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn environment_overrides_land_in_section() {
        let builder = ::config::Config::builder()
            .add_source(toml("[sample]\nname = \"from-file\"\nlimit = 1"))
            .add_source(env(&[("VANTAGE_SAMPLE__LIMIT", "7"), ("UNRELATED", "1")]));
        let section: Section = load_section(builder, "sample").unwrap();
        assert_eq!(section.limit, 7);
        assert_eq!(section.name, "from-file");
    }
}
