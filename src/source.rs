//! Content acquisition.
//!
//! Resolves a CLI target into document text: a local file, or a file in a
//! GitHub repository addressed by its blob URL. Remote content is fetched
//! through the [`gh`](https://cli.github.com/) CLI so that the user's
//! existing GitHub authentication applies.
//!
//! Failures here are [`SourceError`]s and are kept distinct from analysis
//! results: an unreadable file is not a dangerous file.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use walkdir::WalkDir;

/// File name searched for by [`find_skill_files`].
pub const SKILL_FILE_NAME: &str = "SKILL.md";

static RE_BLOB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://github\.com/([a-zA-Z0-9_.-]+)/([a-zA-Z0-9_.-]+)/blob/([^/]+)/(.+)$")
        .unwrap()
});

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{label} is {size} bytes, larger than the {limit}-byte limit")]
    TooLarge { label: String, size: u64, limit: u64 },

    #[error(
        "URL must be a GitHub blob URL pointing to a specific file \
         (e.g. https://github.com/owner/repo/blob/main/SKILL.md): {0}"
    )]
    NotBlobUrl(String),

    #[error("the gh CLI is required to fetch remote files but was not found on PATH")]
    GhMissing,

    #[error("could not fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

/// A file inside a GitHub repository at a given ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubBlob {
    pub owner: String,
    pub repo: String,
    pub reference: String,
    pub path: String,
}

impl GitHubBlob {
    /// Path for `gh api`.
    pub fn api_endpoint(&self) -> String {
        format!(
            "repos/{}/{}/contents/{}?ref={}",
            self.owner, self.repo, self.path, self.reference
        )
    }
}

/// What a CLI target refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Local(PathBuf),
    GitHub { url: String, blob: GitHubBlob },
}

impl Target {
    /// Classifies `target`: `http://` and `https://` strings are URLs and
    /// must be GitHub blob URLs; anything else is a local path.
    pub fn parse(target: &str) -> Result<Target, SourceError> {
        if !is_url(target) {
            return Ok(Target::Local(PathBuf::from(target)));
        }
        let caps = RE_BLOB_URL
            .captures(target)
            .ok_or_else(|| SourceError::NotBlobUrl(target.to_string()))?;
        Ok(Target::GitHub {
            url: target.to_string(),
            blob: GitHubBlob {
                owner: caps[1].to_string(),
                repo: caps[2].to_string(),
                reference: caps[3].to_string(),
                path: caps[4].to_string(),
            },
        })
    }

    /// Display label used in reports.
    pub fn label(&self) -> String {
        match self {
            Target::Local(path) => path.display().to_string(),
            Target::GitHub { url, .. } => url.clone(),
        }
    }

    /// Directory whose `.skill-check-ignore` applies, for local targets.
    pub fn suppression_dir(&self) -> Option<&Path> {
        match self {
            Target::Local(path) => Some(path.parent().unwrap_or(Path::new("."))),
            Target::GitHub { .. } => None,
        }
    }

    /// Reads or fetches the target's content, enforcing `max_bytes`.
    pub fn load(&self, max_bytes: u64) -> Result<String, SourceError> {
        match self {
            Target::Local(path) => read_local(path, max_bytes),
            Target::GitHub { url, blob } => fetch_github(url, blob, max_bytes),
        }
    }
}

pub fn is_url(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Reads a local file, decoding invalid UTF-8 lossily.
pub fn read_local(path: &Path, max_bytes: u64) -> Result<String, SourceError> {
    let read_err = |source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    };
    let size = std::fs::metadata(path).map_err(read_err)?.len();
    check_size(&path.display().to_string(), size, max_bytes)?;
    let bytes = std::fs::read(path).map_err(read_err)?;
    Ok(decode(&path.display().to_string(), bytes))
}

fn fetch_github(url: &str, blob: &GitHubBlob, max_bytes: u64) -> Result<String, SourceError> {
    if !which_exists("gh") {
        return Err(SourceError::GhMissing);
    }

    let output = Command::new("gh")
        .arg("api")
        .arg("-H")
        .arg("Accept: application/vnd.github.raw")
        .arg(blob.api_endpoint())
        .output()
        .map_err(|e| SourceError::Fetch {
            url: url.to_string(),
            reason: format!("failed to run gh: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SourceError::Fetch {
            url: url.to_string(),
            reason: stderr.trim().to_string(),
        });
    }

    check_size(url, output.stdout.len() as u64, max_bytes)?;
    tracing::debug!(url, bytes = output.stdout.len(), "fetched remote file");
    Ok(decode(url, output.stdout))
}

fn check_size(label: &str, size: u64, limit: u64) -> Result<(), SourceError> {
    if size > limit {
        return Err(SourceError::TooLarge {
            label: label.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

fn decode(label: &str, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(source = label, "content is not valid UTF-8; decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Returns every file named `SKILL.md` (case-insensitive) under `root`,
/// sorted by path.
pub fn find_skill_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .eq_ignore_ascii_case(SKILL_FILE_NAME)
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Returns `true` if an executable named `cmd` exists on `PATH`.
pub fn which_exists(cmd: &str) -> bool {
    std::env::var_os("PATH")
        .map(|path| {
            std::env::split_paths(&path).any(|dir| {
                let candidate = dir.join(cmd);
                if !candidate.is_file() {
                    return false;
                }
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::metadata(&candidate)
                        .map(|m| m.permissions().mode() & 0o111 != 0)
                        .unwrap_or(false)
                }
                #[cfg(not(unix))]
                {
                    true
                }
            })
        })
        .unwrap_or(false)
}
