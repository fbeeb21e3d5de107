//! Decrypt-while-copying primitive consumed by `Store::write_decrypt`.
//!
//! Ciphertext framing for [`XChaChaStream`]:
//! ```text
//! [ 24-byte random nonce ][ payload XOR XChaCha20 keystream ]
//! ```
//! The payload is processed in fixed-size blocks so arbitrarily large streams
//! are never held in memory.

use std::io::{self, Read, Write};

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::{Key, XChaCha20, XNonce};
use rand::RngCore;

use crate::error::DecryptError;

/// Key length for [`XChaChaStream`].
pub const KEY_LEN: usize = 32;

/// Nonce header length for [`XChaChaStream`].
pub const NONCE_LEN: usize = 24;

const BLOCK_SIZE: usize = 32 * 1024;

/// Streams ciphertext from `src` into `dst` as plaintext.
///
/// Implementations return the number of plaintext bytes written.
pub trait CopyDecrypt: std::fmt::Debug + Send + Sync {
    fn copy_decrypt(
        &self,
        key: &[u8],
        src: &mut dyn Read,
        dst: &mut dyn Write,
    ) -> Result<u64, DecryptError>;
}

/// XChaCha20 stream decryption with a nonce header.
#[derive(Debug, Clone, Copy, Default)]
pub struct XChaChaStream;

fn cipher(key: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<XChaCha20, DecryptError> {
    if key.len() != KEY_LEN {
        return Err(DecryptError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        });
    }
    Ok(XChaCha20::new(Key::from_slice(key), XNonce::from_slice(nonce)))
}

/// Apply the keystream to everything left in `src`, writing to `dst`.
fn stream(
    cipher: &mut XChaCha20,
    src: &mut dyn Read,
    dst: &mut dyn Write,
) -> Result<u64, DecryptError> {
    let mut buf = vec![0u8; BLOCK_SIZE];
    let mut written = 0u64;

    loop {
        let n = match src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        cipher.apply_keystream(&mut buf[..n]);
        dst.write_all(&buf[..n])?;
        written += n as u64;
    }

    Ok(written)
}

impl CopyDecrypt for XChaChaStream {
    fn copy_decrypt(
        &self,
        key: &[u8],
        src: &mut dyn Read,
        dst: &mut dyn Write,
    ) -> Result<u64, DecryptError> {
        let mut nonce = [0u8; NONCE_LEN];
        src.read_exact(&mut nonce).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                DecryptError::TruncatedHeader(NONCE_LEN)
            } else {
                DecryptError::Io(e)
            }
        })?;

        let mut cipher = cipher(key, &nonce)?;
        stream(&mut cipher, src, dst)
    }
}

/// Encrypt `src` into `dst` with a fresh random nonce.
///
/// Returns the number of bytes written, nonce header included.
pub fn copy_encrypt(
    key: &[u8],
    src: &mut dyn Read,
    dst: &mut dyn Write,
) -> Result<u64, DecryptError> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let mut cipher = cipher(key, &nonce)?;
    dst.write_all(&nonce)?;
    let n = stream(&mut cipher, src, dst)?;
    Ok(n + NONCE_LEN as u64)
}
