use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "khata.toml";

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    /// Text journal read at startup.
    pub journal: Option<PathBuf>,
    /// Account used to auto-balance single-line entries.
    pub offset_account: String,
    /// Account that pays for assets bought through the CLI.
    pub funding_account: String,
    pub log_level: String,
    /// Start from the built-in chart of accounts before reading the journal.
    pub seed_default_chart: bool,
}

impl Settings {
    /// Defaults, then `khata.toml` (or `config_path`), then `KHATA_*` variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let file = match config_path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .set_default("offset_account", "1000")?
            .set_default("funding_account", "1000")?
            .set_default("log_level", "info")?
            .set_default("seed_default_chart", true)?
            .add_source(file)
            .add_source(Environment::with_prefix("KHATA"))
            .build()
            .context("cannot load settings")?
            .try_deserialize()
            .context("invalid settings")
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;

    use anyhow::Result;

    #[test]
    fn test_defaults() -> Result<()> {
        let settings = Settings::load(None)?;
        assert_eq!(settings.offset_account, "1000");
        assert_eq!(settings.funding_account, "1000");
        assert_eq!(settings.log_level, "info");
        assert!(settings.seed_default_chart);
        Ok(())
    }

    #[test]
    fn test_config_file() -> Result<()> {
        let path = std::env::temp_dir().join(format!("khata-settings-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "offset_account = \"1100\"\nseed_default_chart = false\njournal = \"books.khata\"\n",
        )?;
        let settings = Settings::load(Some(&path))?;
        std::fs::remove_file(&path)?;

        assert_eq!(settings.offset_account, "1100");
        assert_eq!(settings.funding_account, "1000");
        assert!(!settings.seed_default_chart);
        assert_eq!(settings.journal.unwrap().to_str(), Some("books.khata"));
        Ok(())
    }
}
