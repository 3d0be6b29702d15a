//! Where the site parameters come from. Built in constants first, then an
//! optional `molta.toml`, then `MOLTA_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::stack::{StackProps, ACCOUNT, DOMAIN_NAME, REGION, STACK_NAME};

pub const CONFIG_FILE: &str = "molta.toml";
pub const DEFAULT_OUT_DIR: &str = "infra.out";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub domain_name: String,
    pub account: String,
    pub region: String,
    pub stack_name: String,
    pub out_dir: PathBuf,
    pub context_file: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain_name: DOMAIN_NAME.to_string(),
            account: ACCOUNT.to_string(),
            region: REGION.to_string(),
            stack_name: STACK_NAME.to_string(),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            context_file: PathBuf::from(aws_route53::CONTEXT_FILE),
        }
    }
}

/// every field optional: whatever is set overrides the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    domain_name: Option<String>,
    account: Option<String>,
    region: Option<String>,
    stack_name: Option<String>,
    out_dir: Option<PathBuf>,
    context_file: Option<PathBuf>,
}

impl SiteConfig {
    /// defaults, overridden by the config file if there is one,
    /// overridden by the process environment.
    pub fn load(config_file: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        let path = config_file.unwrap_or(Path::new(CONFIG_FILE));
        match std::fs::read_to_string(path) {
            Ok(body) => {
                config.apply_toml(&body)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                tracing::debug!(path = %path.display(), "loaded config file");
            }
            // only an explicitly requested file has to exist
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && config_file.is_none() => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        }
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_toml(&mut self, body: &str) -> anyhow::Result<()> {
        let file: FileConfig = toml::from_str(body)?;
        if let Some(v) = file.domain_name { self.domain_name = v; }
        if let Some(v) = file.account { self.account = v; }
        if let Some(v) = file.region { self.region = v; }
        if let Some(v) = file.stack_name { self.stack_name = v; }
        if let Some(v) = file.out_dir { self.out_dir = v; }
        if let Some(v) = file.context_file { self.context_file = v; }
        Ok(())
    }

    /// `get` looks up an environment variable. Empty values are ignored.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| get(key).filter(|v| !v.is_empty());
        if let Some(v) = get("MOLTA_DOMAIN_NAME") { self.domain_name = v; }
        if let Some(v) = get("MOLTA_ACCOUNT") { self.account = v; }
        if let Some(v) = get("MOLTA_REGION") { self.region = v; }
        if let Some(v) = get("MOLTA_STACK_NAME") { self.stack_name = v; }
        if let Some(v) = get("MOLTA_OUT_DIR") { self.out_dir = PathBuf::from(v); }
        if let Some(v) = get("MOLTA_CONTEXT_FILE") { self.context_file = PathBuf::from(v); }
    }

    pub fn props(&self) -> infra_lib::Result<StackProps> {
        StackProps::new(&self.stack_name, &self.domain_name, &self.account, &self.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_production_site() {
        let config = SiteConfig::default();
        assert_eq!(config.props().unwrap(), StackProps::from_constants().unwrap());
        assert_eq!(config.out_dir, PathBuf::from("infra.out"));
        assert_eq!(config.context_file, PathBuf::from("molta.context.json"));
    }

    #[test]
    fn env_overrides_file_overrides_defaults() {
        let mut config = SiteConfig::default();
        config.apply_toml(r#"
            domain_name = "example.org"
            region = "eu-west-1"
        "#).unwrap();
        assert_eq!(config.domain_name, "example.org");
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.account, ACCOUNT);

        let env: HashMap<&str, &str> = [("MOLTA_REGION", "us-east-1"), ("MOLTA_STACK_NAME", "")].into();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.stack_name, STACK_NAME);
        assert_eq!(config.domain_name, "example.org");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut config = SiteConfig::default();
        assert!(config.apply_toml("domain = \"typo.com\"").is_err());
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SiteConfig::load(Some(&dir.path().join("missing.toml"))).is_err());

        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "out_dir = \"build\"\n").unwrap();
        let config = SiteConfig::load(Some(&path)).unwrap();
        // MOLTA_OUT_DIR in the test environment would win
        if std::env::var("MOLTA_OUT_DIR").is_err() {
            assert_eq!(config.out_dir, PathBuf::from("build"));
        }
    }

    #[test]
    fn bad_values_fail_when_building_props() {
        let mut config = SiteConfig::default();
        config.account = "123".into();
        assert!(config.props().is_err());
    }
}
