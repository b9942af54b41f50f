use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/callback";
pub const DEFAULT_MAX_RESULTS: usize = 10;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub client_id: String,
    /// Google client-secrets JSON; overrides `client_id` when set.
    pub client_secrets_file: Option<PathBuf>,
    pub user_email: Option<String>,
    pub redirect_uri: Option<String>,
    pub token_file: Option<PathBuf>,
    pub api_base: Option<String>,
    pub user_id: Option<String>,
    pub query: Option<String>,
    pub max_results: Option<usize>,
    pub results_per_page: Option<usize>,
}

impl Config {
    fn template() -> Self {
        Self {
            client_id: "YOUR_CLIENT_ID.apps.googleusercontent.com".to_string(),
            client_secrets_file: None,
            user_email: Some("you@example.com".to_string()),
            redirect_uri: Some(DEFAULT_REDIRECT_URI.to_string()),
            token_file: None,
            api_base: None,
            user_id: None,
            query: None,
            max_results: Some(DEFAULT_MAX_RESULTS),
            results_per_page: None,
        }
    }

    pub fn redirect_uri(&self) -> String {
        self.redirect_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string())
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("gmail_reader"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn default_token_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("tokens.json");
    Ok(p)
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Reads `path`, or writes an editable template there and fails if it is missing.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let tom = toml::to_string_pretty(&Config::template())?;
        fs::write(path, tom)?;
        return Err(anyhow::anyhow!(
            "Created template config at {}: edit it and run again",
            path.display()
        ));
    }
    parse_config(path)
}

fn parse_config(path: &Path) -> Result<Config> {
    let s = fs::read_to_string(path)?;
    toml::from_str(&s).with_context(|| format!("invalid config {}", path.display()))
}

/// Reads `path` without ever writing to it. A missing file is `None` unless `required`.
pub fn read_config_at(path: &Path, required: bool) -> Result<Option<Config>> {
    if !path.exists() {
        if required {
            return Err(anyhow::anyhow!("config {} does not exist", path.display()));
        }
        return Ok(None);
    }
    parse_config(path).map(Some)
}

/// Config for runs that can do without one: an explicit path must exist,
/// the default location may be absent.
pub fn load_optional_config(explicit: Option<&Path>) -> Result<Option<Config>> {
    match explicit {
        Some(p) => read_config_at(p, true),
        None => read_config_at(&config_dir()?.join("config.toml"), false),
    }
}

pub fn resolve_token_path(cfg: &Config) -> Result<PathBuf> {
    match &cfg.token_file {
        Some(p) => Ok(p.clone()),
        None => default_token_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_writes_template_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("Created template config"));
        assert!(path.exists());

        // the template itself parses
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg, Config::template());
    }

    #[test]
    fn config_is_read_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
client_id = "abc"
user_email = "me@example.com"
token_file = "/tmp/tok.json"
query = "from:me after:2023-01-01"
max_results = 25
results_per_page = 5
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.client_id, "abc");
        assert_eq!(cfg.query.as_deref(), Some("from:me after:2023-01-01"));
        assert_eq!(cfg.max_results, Some(25));
        assert_eq!(cfg.results_per_page, Some(5));
        assert_eq!(cfg.redirect_uri(), DEFAULT_REDIRECT_URI);
        assert_eq!(
            resolve_token_path(&cfg).unwrap(),
            PathBuf::from("/tmp/tok.json")
        );
    }

    #[test]
    fn optional_config_missing_is_none_and_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(read_config_at(&path, false).unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn explicit_missing_config_fails_without_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let err = load_optional_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(!path.exists());
    }

    #[test]
    fn malformed_optional_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "query = \"from:me\"\nmax_results = \"lots\"\n").unwrap();

        let err = load_optional_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
        assert!(read_config_at(&path, false).is_err());
    }
}
