//! AES-GCM sealing and opening of individual string values.
//!
//! **Algorithm:** AES-128-GCM or AES-256-GCM, selected by key length, with a
//! 96-bit random nonce and a 128-bit tag. No associated data.
//!
//! **Never seal with a caller-chosen nonce.** GCM nonce reuse under one key is
//! catastrophic: it breaks both confidentiality and authentication. [`seal`]
//! always draws a fresh nonce from the OS CSPRNG.

use std::fmt;
use std::str::FromStr;

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes128Gcm, Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use super::key::KeySize;

/// Byte length of an AES-GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the AES-GCM authentication tag (16 bytes = 128 bits).
pub const TAG_LEN: usize = 16;

/// Smallest valid decoded envelope: nonce plus tag around an empty ciphertext.
pub const MIN_ENVELOPE_LEN: usize = NONCE_LEN + TAG_LEN;

/// Errors produced by the cipher layer.
///
/// Messages never include key, nonce, tag or plaintext bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CipherError {
    /// The key is not 16 or 32 bytes long. Carries the observed length.
    #[error("invalid key length: expected 16 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// A requested key size is not 128 or 256 bits. Carries the bit count.
    #[error("unsupported key size: expected 128 or 256 bits, got {0}")]
    UnsupportedKeyBits(u16),

    /// The key text is not valid standard base64.
    #[error("invalid key encoding: expected standard base64")]
    InvalidKeyEncoding,

    /// The envelope is not valid base64, or decodes to fewer than
    /// [`MIN_ENVELOPE_LEN`] bytes.
    #[error("malformed envelope")]
    MalformedEnvelope,

    /// Tag verification failed: wrong key, or the envelope was altered.
    #[error("envelope authentication failed")]
    AuthenticationFailure,

    /// The AEAD backend or the OS random source could not be used.
    #[error("crypto backend failure")]
    CryptoBackend,

    /// The envelope authenticated but its plaintext is not UTF-8.
    #[error("opened plaintext is not valid UTF-8")]
    InvalidUtf8,
}

/// A parsed envelope: `nonce || ciphertext || tag`.
///
/// The string representation is standard padded base64 of the concatenated
/// bytes, with no line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    nonce: [u8; NONCE_LEN],
    /// Ciphertext followed by the authentication tag.
    sealed: Vec<u8>,
}

impl Envelope {
    /// Split decoded envelope bytes into nonce and sealed payload.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::MalformedEnvelope`] if `bytes` is shorter than
    /// [`MIN_ENVELOPE_LEN`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        if bytes.len() < MIN_ENVELOPE_LEN {
            return Err(CipherError::MalformedEnvelope);
        }
        let (nonce_bytes, sealed) = bytes.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);
        Ok(Self {
            nonce,
            sealed: sealed.to_vec(),
        })
    }

    /// Decode envelope text back into an [`Envelope`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::MalformedEnvelope`] if the text is not standard
    /// padded base64 or is too short once decoded.
    pub fn parse(text: &str) -> Result<Self, CipherError> {
        let bytes = STANDARD
            .decode(text)
            .map_err(|_| CipherError::MalformedEnvelope)?;
        Self::from_bytes(&bytes)
    }

    /// The concatenated binary form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + self.sealed.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.sealed);
        out
    }

    /// Encode this envelope to its transport text.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// The 12-byte nonce region.
    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// The ciphertext region; as long as the sealed plaintext.
    pub fn ciphertext(&self) -> &[u8] {
        &self.sealed[..self.sealed.len() - TAG_LEN]
    }

    /// The 16-byte tag region.
    pub fn tag(&self) -> &[u8] {
        &self.sealed[self.sealed.len() - TAG_LEN..]
    }

    /// Verify and decrypt this envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] if `key` is not 16 or 32 bytes.
    /// Returns [`CipherError::AuthenticationFailure`] if the tag does not verify.
    pub fn open(&self, key: &[u8]) -> Result<Vec<u8>, CipherError> {
        let backend = Backend::new(key)?;
        backend
            .decrypt(&self.nonce, &self.sealed)
            .ok_or(CipherError::AuthenticationFailure)
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Envelope {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Seal `plaintext` under `key` with a fresh random nonce.
///
/// Each call draws a new 96-bit nonce from the OS CSPRNG, so sealing the same
/// plaintext twice yields two different envelopes.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not 16 or 32 bytes.
/// Returns [`CipherError::CryptoBackend`] if the random source or the AEAD
/// backend fails; this is a platform fault, not worth retrying.
pub fn seal(plaintext: &[u8], key: &[u8]) -> Result<Envelope, CipherError> {
    let backend = Backend::new(key)?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|_| CipherError::CryptoBackend)?;

    seal_with(&backend, nonce, plaintext)
}

/// Seal a UTF-8 string and return the envelope text.
///
/// # Errors
///
/// Same as [`seal`].
pub fn seal_str(plaintext: &str, key: &[u8]) -> Result<String, CipherError> {
    seal(plaintext.as_bytes(), key).map(|e| e.encode())
}

/// Verify and decrypt envelope text produced by [`seal`].
///
/// The key length is checked before the envelope is parsed.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not 16 or 32 bytes.
/// Returns [`CipherError::MalformedEnvelope`] if `envelope` does not decode to
/// at least [`MIN_ENVELOPE_LEN`] bytes.
/// Returns [`CipherError::AuthenticationFailure`] on wrong key or tampering.
pub fn open(envelope: &str, key: &[u8]) -> Result<Vec<u8>, CipherError> {
    let backend = Backend::new(key)?;
    let parsed = Envelope::parse(envelope)?;
    backend
        .decrypt(&parsed.nonce, &parsed.sealed)
        .ok_or(CipherError::AuthenticationFailure)
}

/// [`open`], then require the plaintext to be UTF-8.
///
/// # Errors
///
/// As [`open`], plus [`CipherError::InvalidUtf8`].
pub fn open_to_string(envelope: &str, key: &[u8]) -> Result<String, CipherError> {
    let bytes = open(envelope, key)?;
    String::from_utf8(bytes).map_err(|_| CipherError::InvalidUtf8)
}

/// Seal under an explicit nonce, for known-answer tests.
#[cfg(test)]
pub(crate) fn seal_with_nonce(
    plaintext: &[u8],
    key: &[u8],
    nonce: [u8; NONCE_LEN],
) -> Result<Envelope, CipherError> {
    let backend = Backend::new(key)?;
    seal_with(&backend, nonce, plaintext)
}

fn seal_with(
    backend: &Backend,
    nonce: [u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Envelope, CipherError> {
    let sealed = backend
        .encrypt(&nonce, plaintext)
        .ok_or(CipherError::CryptoBackend)?;
    Ok(Envelope { nonce, sealed })
}

/// Key-size-specific AES-GCM instance. Expanded key state is zeroed on drop.
enum Backend {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl Backend {
    fn new(key: &[u8]) -> Result<Self, CipherError> {
        let built = match KeySize::from_len(key.len())? {
            KeySize::Aes128 => Aes128Gcm::new_from_slice(key).map(Backend::Aes128),
            KeySize::Aes256 => Aes256Gcm::new_from_slice(key).map(Backend::Aes256),
        };
        built.map_err(|_| CipherError::CryptoBackend)
    }

    fn encrypt(&self, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Option<Vec<u8>> {
        let nonce = Nonce::from_slice(nonce.as_slice());
        match self {
            Backend::Aes128(c) => c.encrypt(nonce, plaintext).ok(),
            Backend::Aes256(c) => c.encrypt(nonce, plaintext).ok(),
        }
    }

    fn decrypt(&self, nonce: &[u8; NONCE_LEN], sealed: &[u8]) -> Option<Vec<u8>> {
        let nonce = Nonce::from_slice(nonce.as_slice());
        match self {
            Backend::Aes128(c) => c.decrypt(nonce, sealed).ok(),
            Backend::Aes256(c) => c.decrypt(nonce, sealed).ok(),
        }
    }
}
