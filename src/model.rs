use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tempfile::TempPath;
use url::Url;

/// A zip archive of a project folder, living in scratch storage.
///
/// The file is removed when the `Archive` is dropped.
#[derive(Debug)]
pub struct Archive {
    file: TempPath,
    pub size_bytes: u64,
}

impl Archive {
    pub fn new(file: TempPath, size_bytes: u64) -> Self {
        Self { file, size_bytes }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    /// File name used when the archive is sent to a host.
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project.zip".to_string())
    }
}

/// The link a backend returns after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareLink(String);

impl ShareLink {
    pub fn new(link: impl Into<String>) -> Self {
        Self(link.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the bytes behind a [`DirectDownloadUrl`] are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadEncoding {
    /// The response body is the zip archive itself
    #[default]
    Raw,

    /// The response body is the zip archive as standard base64 text
    Base64,
}

/// A resolved, directly fetchable archive location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectDownloadUrl {
    pub url: Url,
    pub encoding: PayloadEncoding,
}

impl DirectDownloadUrl {
    pub fn raw(url: Url) -> Self {
        Self {
            url,
            encoding: PayloadEncoding::Raw,
        }
    }
}

/// A downloaded archive in scratch storage, removed on drop.
#[derive(Debug)]
pub struct LocalFile {
    file: TempPath,
    pub size_bytes: u64,
}

impl LocalFile {
    pub fn new(file: TempPath, size_bytes: u64) -> Self {
        Self { file, size_bytes }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }
}

/// Marker files that select a dependency installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyManifest {
    /// `package.json`, installed with npm
    PackageJson,

    /// `requirements.txt`, installed with pip
    Requirements,
}

impl DependencyManifest {
    /// Recognized manifests in the order they are checked.
    pub const PRIORITY: [DependencyManifest; 2] =
        [DependencyManifest::PackageJson, DependencyManifest::Requirements];

    pub fn file_name(self) -> &'static str {
        match self {
            DependencyManifest::PackageJson => "package.json",
            DependencyManifest::Requirements => "requirements.txt",
        }
    }

    pub fn installer(self) -> InstallerCommand {
        match self {
            DependencyManifest::PackageJson => InstallerCommand {
                program: if cfg!(windows) { "npm.cmd" } else { "npm" }.to_string(),
                args: vec!["install".to_string()],
            },
            DependencyManifest::Requirements => InstallerCommand {
                program: if cfg!(windows) { "pip.exe" } else { "pip" }.to_string(),
                args: vec![
                    "install".to_string(),
                    "-r".to_string(),
                    "requirements.txt".to_string(),
                ],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for InstallerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A bearer token. Never printed, never written to disk.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
