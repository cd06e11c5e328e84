//! Top-level install driver.
//!
//! With an explicit source the manifest is skipped and the user's `--sha512`
//! (if any) is enforced. Without one, each tool is resolved from its signed
//! manifest and the manifest checksum is always enforced. Manifests are trusted
//! if signed by the mirror's pinned key or any configured key. Tools run one after
//! another; a failure in one does not stop the next.
//!
//! Per tool: `Start → Resolving (default flow only) → Fetching → Verifying →
//! Installing → Done`, or `Aborted` on decline or error.

mod request;
mod shell;

pub use request::{InstallOptions, InstallOutcome, InstallRequest, Stage};
pub use shell::{Shell, Unattended};

use crate::checksum::Digest;
use crate::config::{RebarupConfig, DEFAULT_MIRROR};
use crate::error::{display_chain, InstallError};
use crate::fetch::{ArtifactFetcher, CurlTransport, Transport};
use crate::manifest::{ManifestResolver, MirrorKey, TrustedKeys};
use crate::source::Source;
use crate::storage::Installer;
use crate::tool::{artifact_url, ToolIdentifier};
use semver::Version;
use std::collections::HashMap;

/// Manifest URL and artifact URL template for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub list_url: String,
    /// Contains `[VERSION]`.
    pub artifact_template: String,
}

impl Endpoints {
    pub fn for_mirror(tool: ToolIdentifier, mirror: &str) -> Self {
        Self {
            list_url: tool.default_list_url(mirror),
            artifact_template: tool.default_artifact_template(mirror),
        }
    }

    pub fn from_config(cfg: &RebarupConfig, tool: ToolIdentifier) -> Self {
        Self {
            list_url: cfg.list_url(tool),
            artifact_template: cfg.artifact_template(tool),
        }
    }
}

/// Tracks one tool's stage and logs transitions.
struct Progress {
    tool: ToolIdentifier,
    stage: Stage,
}

impl Progress {
    fn new(tool: ToolIdentifier) -> Self {
        Self {
            tool,
            stage: Stage::Start,
        }
    }

    fn advance(&mut self, next: Stage) {
        tracing::debug!(tool = %self.tool, from = ?self.stage, to = ?next, "install stage");
        self.stage = next;
    }

    fn abort(&mut self, err: InstallError) -> InstallError {
        tracing::warn!(tool = %self.tool, stage = ?self.stage, "install aborted: {}", display_chain(&err));
        self.stage = Stage::Aborted;
        err
    }
}

pub struct InstallOrchestrator<S, T = CurlTransport> {
    fetcher: ArtifactFetcher<T>,
    installer: Installer,
    shell: S,
    keys: TrustedKeys,
    mirror_key: Option<MirrorKey>,
    host_version: Option<Version>,
    endpoints: HashMap<ToolIdentifier, Endpoints>,
}

impl<S: Shell> InstallOrchestrator<S, CurlTransport> {
    /// Wire fetcher, installer and resolver inputs from a loaded configuration.
    pub fn from_config(cfg: &RebarupConfig, shell: S) -> Result<Self, InstallError> {
        let tool_home = cfg.resolved_tool_home().map_err(InstallError::Config)?;
        let keys = TrustedKeys::from_pem(&cfg.trusted_keys)
            .map_err(|e| InstallError::Config(anyhow::anyhow!(e)))?;
        let host_version = cfg.host_version().map_err(InstallError::Config)?;
        let fetcher = ArtifactFetcher::new(CurlTransport::new(cfg.curl_options()));

        let mut orchestrator = Self::new(
            fetcher,
            Installer::new(tool_home),
            shell,
            keys,
            host_version,
        );
        if let Some(url) = cfg.resolved_public_key_url() {
            let keys_dir = cfg.resolved_keys_dir().map_err(InstallError::Config)?;
            orchestrator = orchestrator.with_mirror_key(MirrorKey::new(url, keys_dir));
        }
        for tool in ToolIdentifier::ALL {
            orchestrator = orchestrator.with_endpoints(tool, Endpoints::from_config(cfg, tool));
        }
        Ok(orchestrator)
    }
}

impl<S: Shell, T: Transport> InstallOrchestrator<S, T> {
    /// Endpoints default to the public mirror; override with [`Self::with_endpoints`].
    /// Without a host version the default flow fails with `UnknownHostVersion`.
    pub fn new(
        fetcher: ArtifactFetcher<T>,
        installer: Installer,
        shell: S,
        keys: TrustedKeys,
        host_version: impl Into<Option<Version>>,
    ) -> Self {
        let endpoints = ToolIdentifier::ALL
            .into_iter()
            .map(|t| (t, Endpoints::for_mirror(t, DEFAULT_MIRROR)))
            .collect();
        Self {
            fetcher,
            installer,
            shell,
            keys,
            mirror_key: None,
            host_version: host_version.into(),
            endpoints,
        }
    }

    /// Also trust the mirror's own key, pinned on first use.
    pub fn with_mirror_key(mut self, key: MirrorKey) -> Self {
        self.mirror_key = Some(key);
        self
    }

    pub fn with_endpoints(mut self, tool: ToolIdentifier, endpoints: Endpoints) -> Self {
        self.endpoints.insert(tool, endpoints);
        self
    }

    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    /// Install `tool` from `source`, or resolve from the network when no source
    /// is given. With neither, both tools are installed.
    pub fn run(
        &self,
        tool: Option<ToolIdentifier>,
        source: Option<&str>,
        opts: &InstallOptions,
    ) -> Result<Vec<InstallOutcome>, InstallError> {
        match (tool, source) {
            (Some(tool), Some(raw)) => Ok(vec![self.install_explicit(tool, raw, opts)?]),
            (None, Some(raw)) => Err(InstallError::InvalidSource(raw.to_string())),
            (tool, None) => {
                if opts.sha512.is_some() {
                    return Err(InstallError::InvalidChecksum(
                        "--sha512 requires an explicit path or URL".to_string(),
                    ));
                }
                let tools = match tool {
                    Some(t) => vec![t],
                    None => ToolIdentifier::ALL.to_vec(),
                };
                let mut outcomes = Vec::with_capacity(tools.len());
                let mut errors = Vec::new();
                for t in tools {
                    match self.install_resolved(t, opts) {
                        Ok(o) => outcomes.push(o),
                        Err(e) => errors.push(e),
                    }
                }
                match InstallError::collect(errors) {
                    Some(e) => Err(e),
                    None => Ok(outcomes),
                }
            }
        }
    }

    /// Explicit path or URL; checksum only if `opts.sha512` is set.
    pub fn install_explicit(
        &self,
        tool: ToolIdentifier,
        raw_source: &str,
        opts: &InstallOptions,
    ) -> Result<InstallOutcome, InstallError> {
        let source = Source::parse(raw_source)?;
        let expected_checksum = opts
            .sha512
            .as_deref()
            .map(Digest::from_hex)
            .transpose()?;
        if let Some(present) = self.already_present(tool, opts) {
            return Ok(present);
        }
        self.execute(InstallRequest {
            tool,
            source,
            expected_checksum,
            force: opts.force,
        })
    }

    /// Resolve from the manifest, then install with the manifest's checksum.
    pub fn install_resolved(
        &self,
        tool: ToolIdentifier,
        opts: &InstallOptions,
    ) -> Result<InstallOutcome, InstallError> {
        if let Some(present) = self.already_present(tool, opts) {
            return Ok(present);
        }
        let mut progress = Progress::new(tool);
        progress.advance(Stage::Resolving);

        let host = self
            .host_version
            .clone()
            .ok_or_else(|| progress.abort(InstallError::UnknownHostVersion { tool }))?;
        let endpoints = self
            .endpoints
            .get(&tool)
            .cloned()
            .unwrap_or_else(|| Endpoints::for_mirror(tool, DEFAULT_MIRROR));
        let keys = self.trusted_keys().map_err(|e| progress.abort(e))?;
        let resolver = ManifestResolver::new(&self.fetcher, &keys, host);
        let release = resolver
            .resolve(tool, &endpoints.list_url)
            .map_err(|e| progress.abort(e))?;

        let url = artifact_url(
            &endpoints.artifact_template,
            &release.version.to_string(),
            &release.host_build.to_string(),
        );
        let source = Source::parse(&url).map_err(|e| progress.abort(e))?;
        self.execute_with(
            progress,
            InstallRequest {
                tool,
                source,
                expected_checksum: Some(release.checksum),
                force: opts.force,
            },
        )
    }

    /// Configured keys plus the mirror key, if one is set up.
    fn trusted_keys(&self) -> Result<TrustedKeys, InstallError> {
        let mut keys = self.keys.clone();
        if let Some(mirror_key) = &self.mirror_key {
            keys.push(mirror_key.load(&self.fetcher)?);
        }
        Ok(keys)
    }

    /// Gate, fetch, verify and install one request.
    pub fn execute(&self, req: InstallRequest) -> Result<InstallOutcome, InstallError> {
        self.execute_with(Progress::new(req.tool), req)
    }

    fn execute_with(
        &self,
        mut progress: Progress,
        req: InstallRequest,
    ) -> Result<InstallOutcome, InstallError> {
        let target = self.installer.target_path(req.tool);
        if !req.force && !self.shell.may_write(&target) {
            progress.advance(Stage::Aborted);
            tracing::info!(tool = %req.tool, path = %target.display(), "install declined");
            return Ok(InstallOutcome::Declined(target));
        }

        let attempted = req.source.to_string();
        progress.advance(Stage::Fetching);
        let bytes = self
            .fetcher
            .fetch(&req.source, req.expected_checksum.as_ref())
            .map_err(|e| {
                if matches!(e, InstallError::ChecksumMismatch { .. }) {
                    progress.stage = Stage::Verifying;
                }
                progress.abort(e).with_remediation(req.tool, &attempted)
            })?;
        if req.expected_checksum.is_some() {
            progress.advance(Stage::Verifying);
        }

        progress.advance(Stage::Installing);
        let path = self
            .installer
            .install(req.tool, &bytes)
            .map_err(|e| progress.abort(e))?;
        progress.advance(Stage::Done);

        self.shell.info(&format!("* creating {}", path.display()));
        Ok(InstallOutcome::Installed(path))
    }

    fn already_present(&self, tool: ToolIdentifier, opts: &InstallOptions) -> Option<InstallOutcome> {
        if !opts.if_missing {
            return None;
        }
        let target = self.installer.target_path(tool);
        if target.exists() {
            self.shell
                .info(&format!("* skipping {} (already installed)", target.display()));
            Some(InstallOutcome::AlreadyPresent(target))
        } else {
            None
        }
    }
}
