//! Chromium password/cookie/card decryption
//!
//! Encrypted values carry a `v10` or `v11` prefix:
//! - Windows: AES-256-GCM, 12-byte nonce right after the prefix
//! - macOS/Linux: AES-128-CBC with fixed IV (space characters)
//!
//! The key is supplied by the caller; how it was obtained (Keychain, DPAPI,
//! keyring) is not this module's concern.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};

use crate::error::SourceError;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Fixed IV used by Chromium on macOS and Linux (16 bytes of space character 0x20)
const CHROMIUM_CBC_IV: [u8; 16] = [0x20; 16];

const GCM_NONCE_LEN: usize = 12;

const VERSION_PREFIXES: [&[u8]; 2] = [b"v10", b"v11"];

/// Check if data is encrypted (has Chromium version prefix)
pub fn is_encrypted(data: &[u8]) -> bool {
    VERSION_PREFIXES.iter().any(|prefix| data.starts_with(prefix))
}

/// Decrypt a Chromium encrypted value into raw bytes.
///
/// Values without a version prefix are returned unchanged; very old
/// profiles stored some fields in plaintext.
pub fn decrypt(key: &[u8], encrypted: &[u8]) -> Result<Vec<u8>, SourceError> {
    if !is_encrypted(encrypted) {
        return Ok(encrypted.to_vec());
    }

    let payload = &encrypted[3..];
    if payload.is_empty() {
        return Ok(Vec::new());
    }

    if cfg!(windows) {
        decrypt_gcm(key, payload)
    } else {
        decrypt_cbc(key, payload)
    }
}

/// Decrypt into a string, replacing invalid UTF-8.
pub fn decrypt_to_string(key: &[u8], encrypted: &[u8]) -> Result<String, SourceError> {
    let plain = decrypt(key, encrypted)?;
    Ok(String::from_utf8_lossy(&plain).into_owned())
}

pub fn decrypt_cbc(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, SourceError> {
    let cipher = Aes128CbcDec::new_from_slices(key, &CHROMIUM_CBC_IV)
        .map_err(|_| SourceError::Decrypt(format!("invalid AES-128 key length {}", key.len())))?;

    let mut buf = ciphertext.to_vec();
    let plain = cipher.decrypt_padded_mut::<Pkcs7>(&mut buf).map_err(|e| {
        SourceError::Decrypt(format!(
            "AES-CBC decryption failed: {:?}. Ciphertext len: {}",
            e,
            ciphertext.len()
        ))
    })?;
    Ok(plain.to_vec())
}

pub fn decrypt_gcm(key: &[u8], payload: &[u8]) -> Result<Vec<u8>, SourceError> {
    if payload.len() <= GCM_NONCE_LEN {
        return Err(SourceError::Decrypt("Encrypted data too short".to_string()));
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| SourceError::Decrypt(format!("invalid AES-256 key length {}", key.len())))?;
    let (nonce, ciphertext) = payload.split_at(GCM_NONCE_LEN);

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| SourceError::Decrypt(format!("AES-GCM decryption failed: {}", e)))
}
