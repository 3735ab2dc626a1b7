//! Sealing, opening and resealing string fields inside JSON records.
//!
//! Fields are addressed with dot-notation paths. Array fields use the `[]`
//! suffix before the dot separator, e.g. `"contacts[].email_enc"`.
//!
//! Every operation rewrites matching string leaves in place. Missing paths and
//! non-string leaves are left untouched. On error the record may be partially
//! rewritten and must be discarded as a whole.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::crypto::{open_to_string, seal_str, CipherError};

/// Errors produced while parsing field rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// A path is empty or contains an empty segment.
    #[error("invalid field path: {0:?}")]
    InvalidPath(String),

    /// A rule names a normalisation that does not exist.
    #[error("unknown normalisation: {0:?}")]
    UnknownNormalize(String),
}

/// Segments of a dot-notation field path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    /// Navigate into an object property by name.
    Key(String),
    /// Expand into every element of a JSON array.
    ArrayItem,
}

/// A parsed dot-notation field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parse a dot-notation path such as `"user.address.zip"` or
    /// `"orders[].card_number"`. A bare `"[]"` addresses a top-level array.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidPath`] if the path or any segment is empty.
    pub fn parse(path: &str) -> Result<Self, FieldError> {
        let invalid = || FieldError::InvalidPath(path.to_owned());
        if path.trim().is_empty() {
            return Err(invalid());
        }

        let mut segments = Vec::new();
        for (i, part) in path.split('.').enumerate() {
            if let Some(key) = part.strip_suffix("[]") {
                if !key.is_empty() {
                    segments.push(PathSegment::Key(key.to_owned()));
                } else if i != 0 {
                    return Err(invalid());
                }
                segments.push(PathSegment::ArrayItem);
            } else if part.is_empty() {
                return Err(invalid());
            } else {
                segments.push(PathSegment::Key(part.to_owned()));
            }
        }
        Ok(Self {
            raw: path.to_owned(),
            segments,
        })
    }

    /// The path as originally written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Text normalisation applied to a plaintext before it is sealed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Normalize {
    /// Leave the text as is.
    #[default]
    None,
    /// Strip leading and trailing whitespace.
    Trim,
    /// Upper-case.
    Upper,
    /// Lower-case.
    Lower,
    /// Strip whitespace, then upper-case. Used for person names.
    TrimUpper,
    /// Strip whitespace, then lower-case. Used for e-mail addresses.
    TrimLower,
}

impl Normalize {
    /// Apply this normalisation to `text`.
    pub fn apply(self, text: &str) -> String {
        match self {
            Normalize::None => text.to_owned(),
            Normalize::Trim => text.trim().to_owned(),
            Normalize::Upper => text.to_uppercase(),
            Normalize::Lower => text.to_lowercase(),
            Normalize::TrimUpper => text.trim().to_uppercase(),
            Normalize::TrimLower => text.trim().to_lowercase(),
        }
    }
}

impl FromStr for Normalize {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Normalize::None),
            "trim" => Ok(Normalize::Trim),
            "upper" => Ok(Normalize::Upper),
            "lower" => Ok(Normalize::Lower),
            "trim_upper" => Ok(Normalize::TrimUpper),
            "trim_lower" => Ok(Normalize::TrimLower),
            _ => Err(FieldError::UnknownNormalize(s.to_owned())),
        }
    }
}

/// A field path plus the normalisation applied before (re)sealing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    /// Which leaves the rule applies to.
    pub path: FieldPath,
    /// Normalisation applied to the plaintext before sealing.
    pub normalize: Normalize,
}

impl FromStr for FieldRule {
    type Err = FieldError;

    /// Parse `path` or `path=normalize`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, normalize) = match s.split_once('=') {
            Some((path, norm)) => (path.trim(), norm.parse()?),
            None => (s.trim(), Normalize::None),
        };
        Ok(Self {
            path: FieldPath::parse(path)?,
            normalize,
        })
    }
}

/// Parse a comma-separated rule list such as
/// `"name_enc=trim_upper,email_enc=lower"`. Empty entries are skipped.
///
/// # Errors
///
/// Returns the first [`FieldError`] encountered.
pub fn parse_rules(list: &str) -> Result<Vec<FieldRule>, FieldError> {
    list.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}

/// Recursively navigate `value` following `segments` and replace any string
/// leaf found at the end of the path with `f(leaf)`.
fn apply_at_path<F>(
    value: &mut Value,
    segments: &[PathSegment],
    f: &mut F,
) -> Result<(), CipherError>
where
    F: FnMut(&str) -> Result<String, CipherError>,
{
    let Some((first, rest)) = segments.split_first() else {
        if let Value::String(s) = value {
            *s = f(s.as_str())?;
        }
        return Ok(());
    };

    match first {
        PathSegment::Key(key) => {
            if let Value::Object(map) = value {
                if let Some(child) = map.get_mut(key) {
                    apply_at_path(child, rest, f)?;
                }
            }
        }
        PathSegment::ArrayItem => {
            if let Value::Array(arr) = value {
                for item in arr.iter_mut() {
                    apply_at_path(item, rest, f)?;
                }
            }
        }
    }
    Ok(())
}

/// Normalise and seal every string field in `record` addressed by `rules`.
///
/// # Errors
///
/// Returns the first [`CipherError`] from [`seal_str`].
pub fn seal_fields(
    record: &mut Value,
    rules: &[FieldRule],
    key: &[u8],
) -> Result<(), CipherError> {
    for rule in rules {
        apply_at_path(record, &rule.path.segments, &mut |plain: &str| {
            seal_str(&rule.normalize.apply(plain), key)
        })?;
    }
    Ok(())
}

/// Open every envelope field in `record` addressed by `rules`.
///
/// # Errors
///
/// Returns the first [`CipherError`] from [`open_to_string`], e.g.
/// [`CipherError::AuthenticationFailure`] for a tampered field.
pub fn open_fields(
    record: &mut Value,
    rules: &[FieldRule],
    key: &[u8],
) -> Result<(), CipherError> {
    for rule in rules {
        apply_at_path(record, &rule.path.segments, &mut |envelope: &str| {
            open_to_string(envelope, key)
        })?;
    }
    Ok(())
}

/// Open, normalise and re-seal every envelope field addressed by `rules`.
///
/// Each rewritten field gets a fresh nonce.
///
/// # Errors
///
/// Returns the first [`CipherError`] from opening or sealing.
pub fn reseal_fields(
    record: &mut Value,
    rules: &[FieldRule],
    key: &[u8],
) -> Result<(), CipherError> {
    for rule in rules {
        apply_at_path(record, &rule.path.segments, &mut |envelope: &str| {
            let plain = open_to_string(envelope, key)?;
            seal_str(&rule.normalize.apply(&plain), key)
        })?;
    }
    Ok(())
}
