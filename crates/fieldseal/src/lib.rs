//! `fieldseal` — AES-GCM sealed envelopes for individual string values.
//!
//! [`seal`] turns a plaintext and a 128- or 256-bit key into a self-contained
//! base64 envelope; [`open`] verifies and reverses it. Both are stateless and
//! safe to call concurrently. [`fields`] and [`batch`] build record-level and
//! stream-level transforms on top of them.

pub mod batch;
pub mod crypto;
pub mod fields;

pub use crypto::{
    generate_key, open, open_to_string, seal, seal_str, CipherError, Envelope, Key, KeySize,
};
