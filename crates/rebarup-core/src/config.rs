use anyhow::{Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::fetch::CurlOptions;
use crate::tool::ToolIdentifier;

/// Env var overriding the tool home.
pub const HOME_ENV: &str = "REBARUP_HOME";
/// Env var overriding the artifact mirror.
pub const MIRROR_ENV: &str = "REBARUP_MIRROR";
/// Env var overriding the host version.
pub const HOST_VERSION_ENV: &str = "REBARUP_HOST_VERSION";
pub const DEFAULT_MIRROR: &str = "https://builds.hex.pm";
/// Key that signs the default mirror's manifests.
pub const DEFAULT_PUBLIC_KEY_URL: &str = "https://repo.hex.pm/public_key";

/// Per-tool URL overrides (optional `[urls.rebar]` / `[urls.rebar3]` tables).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolUrls {
    /// Manifest URL. Default: `<mirror>/installs/<tool>-1.x.csv`.
    #[serde(default)]
    pub list_url: Option<String>,
    /// Artifact URL with `[VERSION]` and optionally `[HOST_VERSION]` placeholders.
    #[serde(default)]
    pub artifact_template: Option<String>,
}

/// Global configuration loaded from `~/.config/rebarup/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebarupConfig {
    /// Install directory; `None` means `$XDG_DATA_HOME/rebarup/tools`.
    #[serde(default)]
    pub tool_home: Option<PathBuf>,
    /// Base URL manifests and artifacts are fetched from.
    pub mirror: String,
    /// Where the mirror publishes its signing key. `None` picks the default
    /// mirror's key, or `<mirror>/public_key` for any other mirror. An empty
    /// string disables the mirror key, leaving only `trusted_keys`.
    #[serde(default)]
    pub public_key_url: Option<String>,
    /// Pinned mirror keys; `None` means `$XDG_DATA_HOME/rebarup/public_keys`.
    #[serde(default)]
    pub keys_dir: Option<PathBuf>,
    /// Extra PEM RSA public keys accepted for manifest signatures.
    #[serde(default)]
    pub trusted_keys: Vec<String>,
    /// Version of the host toolchain. `None` asks `host_version_command`.
    #[serde(default)]
    pub host_version: Option<String>,
    #[serde(default = "default_host_version_command")]
    pub host_version_command: Vec<String>,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    #[serde(default)]
    pub urls: BTreeMap<String, ToolUrls>,
}

fn default_host_version_command() -> Vec<String> {
    vec!["elixir".to_string(), "--short-version".to_string()]
}

impl Default for RebarupConfig {
    fn default() -> Self {
        Self {
            tool_home: None,
            mirror: DEFAULT_MIRROR.to_string(),
            public_key_url: None,
            keys_dir: None,
            trusted_keys: Vec::new(),
            host_version: None,
            host_version_command: default_host_version_command(),
            connect_timeout_secs: 15,
            timeout_secs: 300,
            urls: BTreeMap::new(),
        }
    }
}

impl RebarupConfig {
    /// Apply `REBARUP_HOME` / `REBARUP_MIRROR` / `REBARUP_HOST_VERSION` from
    /// `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(home) = lookup(HOME_ENV).filter(|s| !s.is_empty()) {
            self.tool_home = Some(PathBuf::from(home));
        }
        if let Some(mirror) = lookup(MIRROR_ENV).filter(|s| !s.is_empty()) {
            self.mirror = mirror;
        }
        if let Some(host) = lookup(HOST_VERSION_ENV).filter(|s| !s.is_empty()) {
            self.host_version = Some(host);
        }
    }

    /// Tool home after defaults: explicit setting, else the XDG data dir.
    pub fn resolved_tool_home(&self) -> Result<PathBuf> {
        if let Some(home) = &self.tool_home {
            return Ok(home.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("rebarup")?;
        Ok(xdg_dirs.get_data_home().join("tools"))
    }

    pub fn resolved_keys_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.keys_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("rebarup")?;
        Ok(xdg_dirs.get_data_home().join("public_keys"))
    }

    /// URL of the mirror's signing key, or `None` when disabled.
    pub fn resolved_public_key_url(&self) -> Option<String> {
        match self.public_key_url.as_deref() {
            Some("") => None,
            Some(url) => Some(url.to_string()),
            None if self.mirror.trim_end_matches('/') == DEFAULT_MIRROR => {
                Some(DEFAULT_PUBLIC_KEY_URL.to_string())
            }
            None => Some(format!("{}/public_key", self.mirror.trim_end_matches('/'))),
        }
    }

    /// Host version: the configured value, else whatever `host_version_command`
    /// prints. `Ok(None)` when neither is available; a configured value that is
    /// not a version is an error.
    pub fn host_version(&self) -> Result<Option<Version>> {
        if let Some(raw) = self.host_version.as_deref() {
            let v = Version::parse(raw.trim())
                .with_context(|| format!("invalid host_version {raw:?}"))?;
            return Ok(Some(v));
        }
        Ok(detect_host_version(&self.host_version_command))
    }

    pub fn list_url(&self, tool: ToolIdentifier) -> String {
        self.urls
            .get(tool.binary_name())
            .and_then(|u| u.list_url.clone())
            .unwrap_or_else(|| tool.default_list_url(&self.mirror))
    }

    pub fn artifact_template(&self, tool: ToolIdentifier) -> String {
        self.urls
            .get(tool.binary_name())
            .and_then(|u| u.artifact_template.clone())
            .unwrap_or_else(|| tool.default_artifact_template(&self.mirror))
    }

    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Run `command` and parse the first non-empty line of its stdout as a version.
fn detect_host_version(command: &[String]) -> Option<Version> {
    let (program, args) = command.split_first()?;
    let output = match Command::new(program).args(args).output() {
        Ok(o) => o,
        Err(e) => {
            tracing::debug!(%program, "host version command failed: {e}");
            return None;
        }
    };
    if !output.status.success() {
        tracing::debug!(%program, status = %output.status, "host version command failed");
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    match Version::parse(line) {
        Ok(v) => {
            tracing::debug!(%program, version = %v, "detected host version");
            Some(v)
        }
        Err(e) => {
            tracing::debug!(%program, output = %line, "unparseable host version: {e}");
            None
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rebarup")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists,
/// then apply environment overrides.
pub fn load_or_init() -> Result<RebarupConfig> {
    let path = config_path()?;
    let mut cfg = load_or_init_at(&path)?;
    cfg.apply_env(|k| std::env::var(k).ok());
    Ok(cfg)
}

/// Like [`load_or_init`] for an explicit path, without environment overrides.
pub fn load_or_init_at(path: &Path) -> Result<RebarupConfig> {
    if !path.exists() {
        let default_cfg = RebarupConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RebarupConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
