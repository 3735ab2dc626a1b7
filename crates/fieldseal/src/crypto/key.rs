//! [`Key`]: caller-owned AES key material that zeroes itself on drop.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use super::cipher::CipherError;

/// Supported AES key sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySize {
    /// 128-bit key, selects AES-128-GCM.
    Aes128,
    /// 256-bit key, selects AES-256-GCM.
    Aes256,
}

impl KeySize {
    /// Key length in bytes.
    pub const fn byte_len(self) -> usize {
        match self {
            KeySize::Aes128 => 16,
            KeySize::Aes256 => 32,
        }
    }

    /// Key length in bits.
    pub const fn bits(self) -> u16 {
        match self {
            KeySize::Aes128 => 128,
            KeySize::Aes256 => 256,
        }
    }

    /// Classify a raw key by its byte length.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] for anything other than 16 or 32.
    pub fn from_len(len: usize) -> Result<Self, CipherError> {
        match len {
            16 => Ok(KeySize::Aes128),
            32 => Ok(KeySize::Aes256),
            other => Err(CipherError::InvalidKeyLength(other)),
        }
    }

    /// Map a bit count (`128` or `256`) to a key size.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::UnsupportedKeyBits`] for any other bit count.
    pub fn from_bits(bits: u16) -> Result<Self, CipherError> {
        match bits {
            128 => Ok(KeySize::Aes128),
            256 => Ok(KeySize::Aes256),
            other => Err(CipherError::UnsupportedKeyBits(other)),
        }
    }
}

/// Raw symmetric key bytes, validated to be 16 or 32 bytes long.
///
/// The buffer is overwritten with zeroes when the value is dropped. This is a
/// best-effort measure: copies made by callers before construction, or by the
/// allocator on reallocation, are out of reach.
#[derive(Clone, ZeroizeOnDrop)]
pub struct Key {
    bytes: Vec<u8>,
    #[zeroize(skip)]
    size: KeySize,
}

impl Key {
    /// Copy `bytes` into a new key after validating the length.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] if `bytes` is not 16 or 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CipherError> {
        let size = KeySize::from_len(bytes.len())?;
        Ok(Self {
            bytes: bytes.to_vec(),
            size,
        })
    }

    /// Decode a standard, padded base64 key as supplied by the host environment.
    ///
    /// Leading and trailing whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyEncoding`] if `text` is not valid base64,
    /// or [`CipherError::InvalidKeyLength`] if it decodes to the wrong length.
    pub fn from_base64(text: &str) -> Result<Self, CipherError> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(text.trim())
                .map_err(|_| CipherError::InvalidKeyEncoding)?,
        );
        Self::from_slice(&decoded)
    }

    /// Draw a fresh key of the given size from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::CryptoBackend`] if the OS random source fails.
    pub fn generate(size: KeySize) -> Result<Self, CipherError> {
        let mut bytes = vec![0u8; size.byte_len()];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| CipherError::CryptoBackend)?;
        Ok(Self { bytes, size })
    }

    /// The size class of this key.
    pub fn size(&self) -> KeySize {
        self.size
    }

    /// Encode the key as standard padded base64, for provisioning only.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        write!(f, "Key({}-bit, [REDACTED])", self.size().bits())
    }
}

/// Generate a fresh random key of `bits` (128 or 256) bits.
///
/// Intended for test fixtures and initial provisioning.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] for an unsupported bit count, or
/// [`CipherError::CryptoBackend`] if the OS random source fails.
pub fn generate_key(bits: u16) -> Result<Key, CipherError> {
    Key::generate(KeySize::from_bits(bits)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_size_lengths() {
        assert_eq!(KeySize::Aes128.byte_len(), 16);
        assert_eq!(KeySize::Aes256.byte_len(), 32);
        assert_eq!(KeySize::from_bits(128).unwrap(), KeySize::Aes128);
        assert_eq!(KeySize::from_bits(256).unwrap(), KeySize::Aes256);
    }

    #[test]
    fn key_size_rejects_other_lengths() {
        for len in [0, 1, 15, 17, 24, 31, 33, 64] {
            assert_eq!(
                KeySize::from_len(len),
                Err(CipherError::InvalidKeyLength(len))
            );
        }
        assert!(KeySize::from_bits(192).is_err());
    }

    #[test]
    fn unsupported_bits_report_the_bit_count() {
        let err = generate_key(129).unwrap_err();
        assert_eq!(err, CipherError::UnsupportedKeyBits(129));
        assert_eq!(
            err.to_string(),
            "unsupported key size: expected 128 or 256 bits, got 129"
        );
    }

    #[test]
    fn size_matches_key_length() {
        let short = Key::from_slice(&[1u8; 16]).unwrap();
        let long = Key::from_slice(&[1u8; 32]).unwrap();
        assert_eq!(short.size(), KeySize::Aes128);
        assert_eq!(long.size(), KeySize::Aes256);
        assert_eq!(short.clone().size(), KeySize::Aes128);
        assert_eq!(generate_key(128).unwrap().size(), KeySize::Aes128);
        assert_eq!(short.as_ref().len(), short.size().byte_len());
    }

    #[test]
    fn generate_key_has_requested_length() {
        assert_eq!(generate_key(128).unwrap().as_ref().len(), 16);
        assert_eq!(generate_key(256).unwrap().as_ref().len(), 32);
        assert!(generate_key(512).is_err());
    }

    #[test]
    fn generated_keys_differ() {
        let a = generate_key(256).unwrap();
        let b = generate_key(256).unwrap();
        assert_ne!(a.as_ref(), b.as_ref());
    }

    #[test]
    fn base64_round_trip() {
        let key = generate_key(256).unwrap();
        let text = key.to_base64();
        let decoded = Key::from_base64(&format!("  {text}\n")).unwrap();
        assert_eq!(decoded.as_ref(), key.as_ref());
    }

    #[test]
    fn from_base64_rejects_bad_encoding() {
        assert_eq!(
            Key::from_base64("not base64!").unwrap_err(),
            CipherError::InvalidKeyEncoding
        );
    }

    #[test]
    fn from_base64_rejects_wrong_length() {
        // 24 bytes: AES-192 is not accepted.
        let text = STANDARD.encode([7u8; 24]);
        assert_eq!(
            Key::from_base64(&text).unwrap_err(),
            CipherError::InvalidKeyLength(24)
        );
    }

    #[test]
    fn key_redacted_in_debug() {
        let key = Key::from_slice(&[0xAB; 16]).unwrap();
        let dbg = format!("{key:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(dbg.contains("128-bit"));
        assert!(!dbg.contains("171"));
    }
}
