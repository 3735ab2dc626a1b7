//! AES-GCM envelope encryption primitives.
//!
//! This module is intentionally free of I/O, configuration and logging.
//! It provides the stateless seal/open operations used by the field and
//! batch layers.
//!
//! # Envelope format
//!
//! ```text
//! base64-standard-padded( nonce[12] || ciphertext[len(plaintext)] || tag[16] )
//! ```
//!
//! A decoded envelope is never shorter than 28 bytes. No associated data is
//! bound, so an envelope is portable between any two contexts that share the
//! key; callers that need context binding must provide it out of band.
//!
//! # Usage limits
//!
//! Nonces are 96 random bits per seal. Rotate the key well before 2^32 seals
//! under the same key to stay inside the birthday bound.

pub mod cipher;
pub mod key;

pub use cipher::{
    open, open_to_string, seal, seal_str, CipherError, Envelope, MIN_ENVELOPE_LEN, NONCE_LEN,
    TAG_LEN,
};
pub use key::{generate_key, Key, KeySize};
