//! Mapping from a provider script to the interpreter that runs it

use crate::error::{Result, SessionError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Script types a tool provider may be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Python,
    Node,
    Shell,
}

impl ProviderKind {
    /// Detect the kind from the script's file extension (case-sensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("py") => Some(ProviderKind::Python),
            Some("js") => Some(ProviderKind::Node),
            Some("sh") => Some(ProviderKind::Shell),
            _ => None,
        }
    }

    /// The interpreter command for this kind
    pub fn command(&self) -> &'static str {
        match self {
            ProviderKind::Python => "python",
            ProviderKind::Node => "node",
            ProviderKind::Shell => "sh",
        }
    }

    fn fallbacks(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::Python => &["python3"],
            ProviderKind::Node | ProviderKind::Shell => &[],
        }
    }

    /// Locate the interpreter on `PATH`, trying fallbacks when the primary
    /// command is missing. Returns the bare command if nothing is found so
    /// the spawn error names what was expected.
    pub fn resolve_interpreter(&self) -> PathBuf {
        std::iter::once(self.command())
            .chain(self.fallbacks().iter().copied())
            .find_map(|candidate| which::which(candidate).ok())
            .unwrap_or_else(|| PathBuf::from(self.command()))
    }
}

/// Everything needed to start a provider process
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub kind: ProviderKind,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl LaunchSpec {
    /// Build the launch command for a provider script. Fails with
    /// `UnsupportedToolProviderKind` for unknown extensions; nothing is
    /// spawned here.
    pub fn for_script(script: &Path) -> Result<Self> {
        let kind = ProviderKind::from_path(script).ok_or_else(|| {
            SessionError::UnsupportedToolProviderKind {
                path: script.display().to_string(),
            }
        })?;

        Ok(Self {
            kind,
            program: kind.resolve_interpreter(),
            args: vec![script.as_os_str().to_os_string()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_supported_extensions() {
        let cases = [
            ("weather.py", ProviderKind::Python, "python"),
            ("/srv/tools/server.js", ProviderKind::Node, "node"),
            ("./mock_server.sh", ProviderKind::Shell, "sh"),
        ];

        for (path, kind, command) in cases {
            let spec = LaunchSpec::for_script(Path::new(path)).unwrap();
            assert_eq!(spec.kind, kind, "kind for {}", path);
            assert_eq!(spec.kind.command(), command);
            assert_eq!(spec.args, vec![OsString::from(path)]);
        }
    }

    #[test]
    fn test_unsupported_extensions() {
        for path in ["server.rb", "server", "server.PY", "server.py.bak", ".py"] {
            let err = LaunchSpec::for_script(Path::new(path)).unwrap_err();
            assert!(
                matches!(
                    err,
                    Error::Session(SessionError::UnsupportedToolProviderKind { .. })
                ),
                "expected {} to be rejected",
                path
            );
        }
    }

    #[test]
    fn test_shell_interpreter_resolves() {
        let program = ProviderKind::Shell.resolve_interpreter();
        assert!(program.to_string_lossy().ends_with("sh"));
    }
}
