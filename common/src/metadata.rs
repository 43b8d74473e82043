//! Add-on descriptor parsing and validation.
//!
//! Every add-on carries an `addon.xml` whose root element holds the `id` and
//! `version` attributes. The root element is also what ends up in the
//! repository catalog, so it is kept verbatim alongside the parsed fields.

use crate::error::ValidationError;
use camino::Utf8Path;
use log::debug;
use std::fmt;
use std::fs;

/// File name of the descriptor at the root of every add-on.
pub const DESCRIPTOR_FILE_NAME: &str = "addon.xml";

/// A validated add-on id matching `^[a-z0-9._-]+$`.
///
/// `.` and `..` are refused as well because the id names a directory in the
/// staging area and the published repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(String);

impl PackageId {
    /// Return the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for PackageId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_id(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl AsRef<str> for PackageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated add-on version beginning with `MAJOR.MINOR.PATCH`.
///
/// Anything after the third numeric group (`~beta1`, `+matrix.1`, `.4`) is
/// kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageVersion(String);

impl PackageVersion {
    /// Return the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for PackageVersion {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if !has_semver_prefix(value) {
            return Err(ValidationError::InvalidVersion {
                value: value.to_owned(),
            });
        }
        Ok(Self(value.to_owned()))
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The descriptor's root element, exactly as it appears in `addon.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor(String);

impl Descriptor {
    /// Return the root element source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity, version and raw descriptor of one validated add-on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// The add-on id.
    pub id: PackageId,
    /// The add-on version.
    pub version: PackageVersion,
    /// The verbatim root element.
    pub descriptor: Descriptor,
}

/// Read and validate `addon.xml` at the root of `working_tree`.
///
/// # Errors
///
/// Returns [`ValidationError::DescriptorUnreadable`] if the file cannot be
/// read, otherwise any error from [`parse_descriptor`].
pub fn read_metadata(working_tree: &Utf8Path) -> Result<PackageMetadata, ValidationError> {
    let path = working_tree.join(DESCRIPTOR_FILE_NAME);
    let text = fs::read_to_string(&path).map_err(|e| ValidationError::DescriptorUnreadable {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    let metadata = parse_descriptor(&text)?;
    debug!("validated {} {} from {path}", metadata.id, metadata.version);
    Ok(metadata)
}

/// Parse descriptor text and validate its `id` and `version` attributes.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedDescriptor`] for invalid XML,
/// [`ValidationError::MissingId`] / [`ValidationError::InvalidId`] for a bad
/// id and [`ValidationError::MissingVersion`] /
/// [`ValidationError::InvalidVersion`] for a bad version.
///
/// # Examples
///
/// ```
/// use kodi_repo_common::metadata::parse_descriptor;
///
/// let xml = r#"<addon id="plugin.video.demo" version="1.2.3" name="Demo"/>"#;
/// let metadata = parse_descriptor(xml)?;
/// assert_eq!(metadata.id.as_str(), "plugin.video.demo");
/// assert_eq!(metadata.descriptor.as_str(), xml);
/// # Ok::<(), kodi_repo_common::error::ValidationError>(())
/// ```
pub fn parse_descriptor(text: &str) -> Result<PackageMetadata, ValidationError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let document =
        roxmltree::Document::parse(text).map_err(|e| ValidationError::MalformedDescriptor {
            reason: e.to_string(),
        })?;
    let root = document.root_element();

    let id = root
        .attribute("id")
        .ok_or(ValidationError::MissingId)
        .and_then(PackageId::try_from)?;
    let version = root
        .attribute("version")
        .ok_or(ValidationError::MissingVersion)
        .and_then(PackageVersion::try_from)?;
    let source = text
        .get(root.range())
        .ok_or_else(|| ValidationError::MalformedDescriptor {
            reason: "root element range is outside the document".to_owned(),
        })?;

    Ok(PackageMetadata {
        id,
        version,
        descriptor: Descriptor(source.to_owned()),
    })
}

fn validate_id(value: &str) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidId {
        value: value.to_owned(),
        reason,
    };
    if value.is_empty() {
        return Err(invalid("id is empty".to_owned()));
    }
    if let Some(bad) = value.chars().find(|c| !is_id_char(*c)) {
        return Err(invalid(format!("character '{bad}' is not in [a-z0-9._-]")));
    }
    if value == "." || value == ".." {
        return Err(invalid("id cannot be a relative directory name".to_owned()));
    }
    Ok(())
}

const fn is_id_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '.' | '_' | '-')
}

/// True when `value` starts with `\d+\.\d+\.\d+`.
fn has_semver_prefix(value: &str) -> bool {
    let mut rest = value;
    for group in 0..3 {
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 {
            return false;
        }
        rest = rest.get(digits..).unwrap_or_default();
        if group < 2 {
            match rest.strip_prefix('.') {
                Some(tail) => rest = tail,
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
