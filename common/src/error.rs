//! Error types for locator parsing, descriptor validation and digests.
//!
//! Each variant names the rejected input and the rule it broke so the CLI
//! can print a single actionable line.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising from parsing a package locator string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorParseError {
    /// The locator has no address before its ref or subpath.
    #[error("locator \"{locator}\" has an empty address")]
    EmptyAddress {
        /// The rejected locator string.
        locator: String,
    },

    /// The address or ref starts with `-`, so git would read it as an option.
    #[error("locator \"{locator}\" has {part} \"{value}\" starting with '-'")]
    OptionLike {
        /// The rejected locator string.
        locator: String,
        /// Which part was rejected (`address` or `ref`).
        part: &'static str,
        /// The rejected part.
        value: String,
    },

    /// The subpath is absolute or climbs out of the repository with `..`.
    #[error("locator \"{locator}\" has subpath \"{subpath}\" outside the repository")]
    SubpathEscapes {
        /// The rejected locator string.
        locator: String,
        /// The offending subpath.
        subpath: String,
    },
}

/// Errors arising from reading or validating a package descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The descriptor file could not be read.
    #[error("cannot read descriptor {path}: {reason}")]
    DescriptorUnreadable {
        /// Path of the descriptor file.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// The descriptor is not well-formed XML.
    #[error("malformed descriptor: {reason}")]
    MalformedDescriptor {
        /// Description of the parse failure.
        reason: String,
    },

    /// The root element carries no `id` attribute.
    #[error("descriptor has no id attribute")]
    MissingId,

    /// The `id` attribute contains characters outside `[a-z0-9._-]`.
    #[error("invalid add-on id \"{value}\": {reason}")]
    InvalidId {
        /// The rejected id.
        value: String,
        /// Description of the rule that was broken.
        reason: String,
    },

    /// The root element carries no `version` attribute.
    #[error("descriptor has no version attribute")]
    MissingVersion,

    /// The `version` attribute does not start with `MAJOR.MINOR.PATCH`.
    #[error("invalid add-on version \"{value}\": expected MAJOR.MINOR.PATCH")]
    InvalidVersion {
        /// The rejected version.
        value: String,
    },
}

/// A digest string failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid MD5 digest: {reason}")]
pub struct DigestError {
    /// Description of the validation failure.
    pub reason: String,
}
