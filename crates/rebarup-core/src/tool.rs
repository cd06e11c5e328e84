//! The two installable build tools and their fixed names.

use std::fmt;

/// Placeholder replaced by the resolved tool version in artifact URL templates.
pub const VERSION_PLACEHOLDER: &str = "[VERSION]";
/// Placeholder replaced by the host version the resolved build targets.
pub const HOST_VERSION_PLACEHOLDER: &str = "[HOST_VERSION]";

/// Which build tool to install. Determines manifest URL, artifact URL template
/// and the filename under the tool home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolIdentifier {
    Rebar,
    Rebar3,
}

impl ToolIdentifier {
    /// Both tools, in the order the default flow installs them.
    pub const ALL: [ToolIdentifier; 2] = [ToolIdentifier::Rebar, ToolIdentifier::Rebar3];

    /// Name of the binary and of the installed file.
    pub fn binary_name(self) -> &'static str {
        match self {
            ToolIdentifier::Rebar => "rebar",
            ToolIdentifier::Rebar3 => "rebar3",
        }
    }

    /// Default manifest URL under `mirror` (e.g. `https://builds.hex.pm/installs/rebar3-1.x.csv`).
    pub fn default_list_url(self, mirror: &str) -> String {
        format!(
            "{}/installs/{}-1.x.csv",
            mirror.trim_end_matches('/'),
            self.binary_name()
        )
    }

    /// Default artifact URL template under `mirror`:
    /// `<mirror>/installs/[HOST_VERSION]/<tool>-[VERSION]`.
    pub fn default_artifact_template(self, mirror: &str) -> String {
        format!(
            "{}/installs/{}/{}-{}",
            mirror.trim_end_matches('/'),
            HOST_VERSION_PLACEHOLDER,
            self.binary_name(),
            VERSION_PLACEHOLDER
        )
    }
}

impl fmt::Display for ToolIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// Substitute the tool version and host build version into an artifact URL template.
pub fn artifact_url(template: &str, version: &str, host_version: &str) -> String {
    template
        .replace(VERSION_PLACEHOLDER, version)
        .replace(HOST_VERSION_PLACEHOLDER, host_version)
}
