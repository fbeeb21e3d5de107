//! Tenant-scoped, hash-sharded filesystem storage.
//!
//! Maps an arbitrary string key to a deterministic location under a
//! per-tenant directory, and streams bytes in and out of it:
//!
//! - **path_key**: `PathKey` and the pluggable `PathTransform` strategies
//! - **store**: `Store` with has / write / read / delete / write_decrypt
//! - **crypto**: the decrypt-while-copying primitive used by `write_decrypt`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::io::Read;
//! use tenant_cas::{PathTransform, Store};
//!
//! let store = Store::with_transform("/srv/ssnetwork", PathTransform::ContentHash).unwrap();
//!
//! let n = store.write("peer-1", "momsbestpicture", &b"jpg bytes"[..]).unwrap();
//! assert!(store.has("peer-1", "momsbestpicture"));
//!
//! let (size, mut file) = store.read("peer-1", "momsbestpicture").unwrap();
//! let mut data = Vec::new();
//! file.read_to_end(&mut data).unwrap();
//! assert_eq!(size, n);
//!
//! store.delete("peer-1", "momsbestpicture").unwrap();
//! ```
//!
//! # Configuration
//!
//! See [`StoreConfig`]. Environment variables:
//! - `SSNETWORK_STORE_ROOT`: Root directory (default: `~/.ssnetwork`)
//! - `SSNETWORK_STORE_TRANSFORM`: `identity` or `cas`
//! - `SSNETWORK_STORE_READONLY`: Set to "true" for read-only mode
//!
//! # Concurrency
//!
//! Every operation blocks on filesystem I/O and takes no locks. Two writers
//! racing on the same key leave whichever finished last; callers are expected
//! to write identical content for identical keys.
//!
//! Logging goes through `tracing`; installing a subscriber is up to the
//! embedding process.

pub mod config;
pub mod crypto;
pub mod error;
pub mod path_key;
pub mod store;

// Re-exports for convenience
pub use config::StoreConfig;
pub use crypto::{copy_encrypt, CopyDecrypt, XChaChaStream};
pub use error::{DecryptError, StoreError};
pub use path_key::{cas_path_transform, default_path_transform, PathKey, PathTransform};
pub use store::Store;
