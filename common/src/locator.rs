//! Package locator parsing.
//!
//! A locator names where an add-on lives: `ADDRESS[#REF][:SUBPATH]`. The
//! address is handed to version control unchanged, the optional ref is checked
//! out after cloning, and the subpath selects the add-on directory inside the
//! clone (default `.`).
//!
//! A leading `scheme://` is never split. Any *other* colon in the address is
//! read as the subpath delimiter, so scp-style or port-bearing addresses must
//! carry an explicit subpath:
//!
//! ```
//! use kodi_repo_common::locator::PackageLocator;
//!
//! let locator = PackageLocator::parse("git@example.com:org/repo.git:.")?;
//! assert_eq!(locator.address(), "git@example.com:org/repo.git");
//! assert_eq!(locator.subpath(), ".");
//! # Ok::<(), kodi_repo_common::error::LocatorParseError>(())
//! ```

use crate::error::LocatorParseError;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::fmt;
use std::str::FromStr;

/// Subpath used when a locator does not name one.
pub const DEFAULT_SUBPATH: &str = ".";

/// Git reads arguments starting with this as options, and no valid ref
/// name starts with it.
const OPTION_PREFIX: char = '-';

/// A parsed `ADDRESS[#REF][:SUBPATH]` locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageLocator {
    address: String,
    reference: Option<String>,
    subpath: Utf8PathBuf,
}

impl PackageLocator {
    /// Parse a locator string.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorParseError::EmptyAddress`] when nothing precedes the
    /// ref or subpath, [`LocatorParseError::OptionLike`] when the address or
    /// ref starts with `-`, and [`LocatorParseError::SubpathEscapes`] when
    /// the subpath is absolute or contains `..`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kodi_repo_common::locator::PackageLocator;
    ///
    /// let locator = PackageLocator::parse("https://host/r.git#rel-1.0:plugin.x")?;
    /// assert_eq!(locator.address(), "https://host/r.git");
    /// assert_eq!(locator.reference(), Some("rel-1.0"));
    /// assert_eq!(locator.subpath(), "plugin.x");
    /// # Ok::<(), kodi_repo_common::error::LocatorParseError>(())
    /// ```
    pub fn parse(input: &str) -> Result<Self, LocatorParseError> {
        let (scheme, rest) = split_scheme(input);

        let (head, subpath) = rest.rsplit_once(':').unwrap_or((rest, ""));
        let (address_tail, reference) = match head.split_once('#') {
            Some((address, reference)) => (address, Some(reference)),
            None => (head, None),
        };

        if address_tail.is_empty() {
            return Err(LocatorParseError::EmptyAddress {
                locator: input.to_owned(),
            });
        }

        if address_tail.starts_with(OPTION_PREFIX) {
            return Err(LocatorParseError::OptionLike {
                locator: input.to_owned(),
                part: "address",
                value: address_tail.to_owned(),
            });
        }
        let reference = reference.filter(|r| !r.is_empty());
        if let Some(reference) = reference.filter(|r| r.starts_with(OPTION_PREFIX)) {
            return Err(LocatorParseError::OptionLike {
                locator: input.to_owned(),
                part: "ref",
                value: reference.to_owned(),
            });
        }

        let subpath = if subpath.is_empty() {
            DEFAULT_SUBPATH
        } else {
            subpath
        };
        if escapes_repository(Utf8Path::new(subpath)) {
            return Err(LocatorParseError::SubpathEscapes {
                locator: input.to_owned(),
                subpath: subpath.to_owned(),
            });
        }

        let address = match scheme {
            Some(scheme) => format!("{scheme}://{address_tail}"),
            None => address_tail.to_owned(),
        };

        Ok(Self {
            address,
            reference: reference.map(str::to_owned),
            subpath: Utf8PathBuf::from(subpath),
        })
    }

    /// The version-control address to clone.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The ref to check out, or `None` for the repository's default revision.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// The add-on directory relative to the clone root.
    #[must_use]
    pub fn subpath(&self) -> &Utf8Path {
        &self.subpath
    }
}

impl FromStr for PackageLocator {
    type Err = LocatorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Renders the canonical form, always with an explicit subpath so that the
/// output parses back to the same locator.
impl fmt::Display for PackageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)?;
        if let Some(reference) = &self.reference {
            write!(f, "#{reference}")?;
        }
        write!(f, ":{}", self.subpath)
    }
}

/// Split a leading `scheme://` off `input`.
fn split_scheme(input: &str) -> (Option<&str>, &str) {
    match input.split_once("://") {
        Some((scheme, rest)) if is_scheme(scheme) => (Some(scheme), rest),
        _ => (None, input),
    }
}

/// RFC 3986 scheme: a letter followed by letters, digits, `+`, `-` or `.`.
fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn escapes_repository(subpath: &Utf8Path) -> bool {
    subpath.components().any(|component| {
        matches!(
            component,
            Utf8Component::ParentDir | Utf8Component::RootDir | Utf8Component::Prefix(_)
        )
    })
}
