// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use url::Url;

pub const DEFAULT_PROGRAMS_PATH: &str = "./educational_programs.xlsx";
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Optional YAML file named by `CIPHERBOT_CONFIG`. Every field may be
/// overridden by its environment variable.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub bot_token: Option<String>,
    pub programs_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub poll_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config file {:?}", path))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: Option<String>,
    pub programs_path: PathBuf,
    pub api_url: Url,
    pub poll_timeout_secs: u64,
    pub log_level: String,
}

impl Config {
    /// `.env`, then the optional YAML file, then the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let file = match env::var_os("CIPHERBOT_CONFIG") {
            Some(path) => FileConfig::from_path(Path::new(&path))?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| env::var(key).ok())
    }

    /// Merge `file` with variables looked up through `var`. Non-empty
    /// variables win over file values, which win over defaults.
    pub fn resolve<F>(file: FileConfig, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let bot_token = var("BOT_TOKEN").or(file.bot_token);
        let programs_path = var("PROGRAMS_PATH")
            .map(PathBuf::from)
            .or(file.programs_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAMS_PATH));

        let api_url = var("TELEGRAM_API_URL")
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url =
            Url::parse(&api_url).with_context(|| format!("invalid TELEGRAM_API_URL {:?}", api_url))?;

        let poll_timeout_secs = match var("POLL_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("invalid POLL_TIMEOUT_SECS {:?}", v))?,
            None => file.poll_timeout_secs.unwrap_or(DEFAULT_POLL_TIMEOUT_SECS),
        };

        let log_level = var("LOG_LEVEL")
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            bot_token,
            programs_path,
            api_url,
            poll_timeout_secs,
            log_level,
        })
    }

    pub fn require_token(&self) -> Result<&str> {
        self.bot_token
            .as_deref()
            .ok_or_else(|| anyhow!("BOT_TOKEN is not set (environment, .env or config file)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let cfg = Config::resolve(FileConfig::default(), vars(&[]))?;
        assert_eq!(cfg.bot_token, None);
        assert_eq!(cfg.programs_path, PathBuf::from(DEFAULT_PROGRAMS_PATH));
        assert_eq!(cfg.api_url.as_str(), "https://api.telegram.org/");
        assert_eq!(cfg.poll_timeout_secs, 30);
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.require_token().is_err());
        Ok(())
    }

    #[test]
    fn test_env_overrides_file() -> Result<()> {
        let file = FileConfig {
            bot_token: Some("file-token".into()),
            programs_path: Some("file.csv".into()),
            poll_timeout_secs: Some(5),
            ..Default::default()
        };
        let cfg = Config::resolve(
            file,
            vars(&[
                ("BOT_TOKEN", "env-token"),
                ("POLL_TIMEOUT_SECS", " 50 "),
                ("PROGRAMS_PATH", ""),
            ]),
        )?;
        assert_eq!(cfg.require_token()?, "env-token");
        assert_eq!(cfg.poll_timeout_secs, 50);
        // empty variables fall through to the file value
        assert_eq!(cfg.programs_path, PathBuf::from("file.csv"));
        Ok(())
    }

    #[test]
    fn test_invalid_values() {
        let bad_timeout = vars(&[("POLL_TIMEOUT_SECS", "soon")]);
        assert!(Config::resolve(FileConfig::default(), bad_timeout).is_err());

        let bad_url = vars(&[("TELEGRAM_API_URL", "not a url")]);
        assert!(Config::resolve(FileConfig::default(), bad_url).is_err());
    }

    #[test]
    fn test_yaml_file() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "programs_path: data/programs.parquet")?;
        writeln!(tmp, "api_url: http://localhost:8081")?;
        writeln!(tmp, "log_level: debug")?;

        let file = FileConfig::from_path(tmp.path())?;
        let cfg = Config::resolve(file, vars(&[]))?;
        assert_eq!(cfg.programs_path, PathBuf::from("data/programs.parquet"));
        assert_eq!(cfg.api_url.as_str(), "http://localhost:8081/");
        assert_eq!(cfg.log_level, "debug");
        Ok(())
    }

    #[test]
    fn test_yaml_unknown_field_is_rejected() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "bot_tokne: typo")?;
        assert!(FileConfig::from_path(tmp.path()).is_err());
        Ok(())
    }
}
