//! Layered schema source resolution.
//!
//! A schema file name resolves through an ordered chain of sources; the
//! first hit wins and individual misses are absorbed. Only when the whole
//! chain is exhausted does resolution degrade to the empty fallback, which
//! callers must report as "not resolvable" rather than validating against
//! nothing.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::http_client::HttpClient;
use crate::output::Diagnostics;

/// Where a resolved artifact's bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOrigin {
    ExplicitFile,
    LocalDir,
    CacheDir,
    RemoteUrl,
    EmptyFallback,
}

impl fmt::Display for ArtifactOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ArtifactOrigin::ExplicitFile => "explicit-file",
            ArtifactOrigin::LocalDir => "local-dir",
            ArtifactOrigin::CacheDir => "cache-dir",
            ArtifactOrigin::RemoteUrl => "remote-url",
            ArtifactOrigin::EmptyFallback => "empty-fallback",
        };
        f.write_str(tag)
    }
}

/// A schema reference: an optional namespace plus the location naming it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReference {
    pub namespace: Option<String>,
    pub location: String,
}

/// Schema bytes together with where they were found.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub content: Vec<u8>,
    pub origin: ArtifactOrigin,
    /// Local path or URL the validation engine can re-resolve.
    pub location: String,
}

impl ResolvedArtifact {
    pub fn is_empty_fallback(&self) -> bool {
        self.origin == ArtifactOrigin::EmptyFallback
    }
}

/// Resolves schema file names through the ordered source chain:
/// explicit override, direct path, schema directory, remote repository,
/// empty fallback.
pub struct SourceLocator {
    explicit_file: Option<PathBuf>,
    schema_dir: PathBuf,
    remote_base: String,
    http: HttpClient,
}

impl SourceLocator {
    pub fn new(
        explicit_file: Option<PathBuf>,
        schema_dir: PathBuf,
        remote_base: String,
        http: HttpClient,
    ) -> Self {
        Self {
            explicit_file,
            schema_dir,
            remote_base,
            http,
        }
    }

    /// Whether the caller supplied an explicit schema file for this
    /// invocation.
    pub fn has_explicit_override(&self) -> bool {
        self.explicit_file.is_some()
    }

    /// Resolve schema bytes for `file_name`; the first source that has it
    /// wins.
    ///
    /// The explicit override is the exception to miss-absorption: the caller
    /// named that exact file, so a read failure surfaces as an error instead
    /// of falling through the chain.
    pub async fn resolve(&self, file_name: &str, diag: &Diagnostics) -> Result<ResolvedArtifact> {
        if let Some(path) = &self.explicit_file {
            let content = tokio::fs::read(path).await?;
            diag.say(1, &format!("validation against file {}", path.display()));
            return Ok(ResolvedArtifact {
                content,
                origin: ArtifactOrigin::ExplicitFile,
                location: path.display().to_string(),
            });
        }

        if let Some(content) = try_read(Path::new(file_name)).await {
            diag.say(1, &format!("validation against file {file_name}"));
            return Ok(ResolvedArtifact {
                content,
                origin: ArtifactOrigin::LocalDir,
                location: file_name.to_string(),
            });
        }

        let base = base_name(file_name);
        let cached = self.schema_dir.join(base);
        if let Some(content) = try_read(&cached).await {
            diag.say(1, &format!("validation against file {}", cached.display()));
            return Ok(ResolvedArtifact {
                content,
                origin: ArtifactOrigin::CacheDir,
                location: cached.display().to_string(),
            });
        }

        let url = if is_url(file_name) {
            file_name.to_string()
        } else {
            format!("{}{}", self.remote_base, base)
        };
        match self.http.fetch_windows1250(&url).await {
            Ok(text) => {
                diag.say(1, &format!("validation against URL {url}"));
                Ok(ResolvedArtifact {
                    content: text.into_bytes(),
                    origin: ArtifactOrigin::RemoteUrl,
                    location: url,
                })
            }
            Err(err) => {
                diag.say(1, &format!("schema source {url} unreachable ({err})"));
                Ok(ResolvedArtifact {
                    content: Vec::new(),
                    origin: ArtifactOrigin::EmptyFallback,
                    location: url,
                })
            }
        }
    }
}

fn is_url(name: &str) -> bool {
    name.starts_with("http://") || name.starts_with("https://")
}

/// Base name of a path or URL.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

async fn try_read(path: &Path) -> Option<Vec<u8>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => tokio::fs::read(path).await.ok(),
        _ => None,
    }
}
