use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};

use crate::{Error, Result};

/// Encrypts a plaintext string using AES-256-GCM and a 32-byte key.
///
/// Returns a hex-encoded string containing a freshly generated nonce followed
/// by the ciphertext. Output differs between calls for the same input; only
/// the round trip back to plaintext is guaranteed.
pub fn encrypt(plaintext: &str, key: &[u8]) -> Result<String> {
    if key.len() != 32 {
        return Err(Error::Internal("encryption key must be 32 bytes".to_string()));
    }
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| Error::Internal(e.to_string()))?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng); // 96 bits / 12 bytes
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| Error::Internal(e.to_string()))?;

    let mut combined = nonce.to_vec();
    combined.extend_from_slice(&ciphertext);
    Ok(hex::encode(combined))
}

/// Decrypts a hex-encoded ciphertext string using AES-256-GCM and a 32-byte key.
///
/// The `cipher_hex` must be the output of [`encrypt`]. Anything else fails
/// with [`Error::Decode`]: the plaintext is unrecoverable, which callers must
/// keep distinct from "the field was never set".
pub fn decrypt(cipher_hex: &str, key: &[u8]) -> Result<String> {
    if key.len() != 32 {
        return Err(Error::Internal("encryption key must be 32 bytes".to_string()));
    }
    let combined = hex::decode(cipher_hex).map_err(|e| Error::Decode(e.to_string()))?;
    if combined.len() < 12 {
        return Err(Error::Decode("ciphertext too short".to_string()));
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| Error::Internal(e.to_string()))?;
    let (nonce_bytes, ciphertext) = combined.split_at(12);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext_bytes = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| Error::Decode("ciphertext rejected (wrong key or corrupt data)".to_string()))?;
    String::from_utf8(plaintext_bytes).map_err(|e| Error::Decode(e.to_string()))
}
