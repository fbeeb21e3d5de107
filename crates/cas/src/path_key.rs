//! PathKey: the physical decomposition of a logical key.
//!
//! A [`PathTransform`] turns an opaque key into a directory path plus a
//! terminal filename. Two strategies exist:
//!
//! - **Identity**: the key is both the directory and the filename
//!   (`<key>/<key>`).
//! - **ContentHash**: SHA-1 of the key, hex-encoded (40 chars), split into
//!   8 blocks of 5 chars for directory fan-out, with the full digest as the
//!   filename.
//!
//! ```text
//! cas_path_transform("abc")
//!   pathname: a9993/e3647/06816/aba3e/25717/850c2/6c9cd/0d89d
//!   filename: a9993e364706816aba3e25717850c26c9cd0d89d
//! ```

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Width of each directory segment produced by the content-hash transform.
pub const SHARD_WIDTH: usize = 5;

/// Length of a hex-encoded SHA-1 digest.
pub const DIGEST_HEX_LEN: usize = 40;

/// A logical key resolved into a directory path and a filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathKey {
    /// Slash-separated directory segments.
    pub pathname: String,
    /// Name of the terminal file.
    pub filename: String,
}

impl PathKey {
    /// The first segment of the pathname.
    ///
    /// Deletion operates on this directory, not on the single file.
    pub fn first_path_name(&self) -> &str {
        self.pathname.split('/').next().unwrap_or("")
    }

    /// Render as `/{pathname}/{filename}`.
    pub fn full_path(&self) -> String {
        format!("/{}/{}", self.pathname, self.filename)
    }

    /// Every path component, directories first, then the filename.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.pathname.split('/').chain(self.filename.split('/'))
    }

    /// The key as a relative filesystem path.
    pub fn relative_path(&self) -> PathBuf {
        self.segments().collect()
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_path())
    }
}

/// Strategy used to lay keys out on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathTransform {
    /// `<key>/<key>`, no sharding.
    #[default]
    Identity,
    /// SHA-1 of the key split into 8 five-character directory levels.
    #[serde(alias = "cas")]
    ContentHash,
}

/// Error returned when a transform name is not recognised.
#[derive(Debug, Error)]
#[error("unknown path transform {0:?}: expected \"identity\" or \"cas\"")]
pub struct UnknownTransform(pub String);

impl PathTransform {
    /// Resolve a key with this strategy.
    pub fn transform(&self, key: &str) -> PathKey {
        match self {
            PathTransform::Identity => default_path_transform(key),
            PathTransform::ContentHash => cas_path_transform(key),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathTransform::Identity => "identity",
            PathTransform::ContentHash => "content_hash",
        }
    }
}

impl fmt::Display for PathTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathTransform {
    type Err = UnknownTransform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "identity" | "default" => Ok(PathTransform::Identity),
            "cas" | "content_hash" | "content-hash" => Ok(PathTransform::ContentHash),
            other => Err(UnknownTransform(other.to_string())),
        }
    }
}

/// Identity transform: the key is used as both pathname and filename.
pub fn default_path_transform(key: &str) -> PathKey {
    PathKey {
        pathname: key.to_string(),
        filename: key.to_string(),
    }
}

/// Content-hash transform: SHA-1 of the key, sharded into 5-char directories.
///
/// The hash is taken over the key string itself, not over stored content.
pub fn cas_path_transform(key: &str) -> PathKey {
    let digest = hex::encode(Sha1::digest(key.as_bytes()));

    let segments: Vec<&str> = (0..digest.len() / SHARD_WIDTH)
        .map(|i| &digest[i * SHARD_WIDTH..(i + 1) * SHARD_WIDTH])
        .collect();

    PathKey {
        pathname: segments.join("/"),
        filename: digest,
    }
}
