//! Shared domain primitives for kodi-repo: package locators, add-on
//! descriptor validation, catalog generation and the catalog checksum.
//!
//! Nothing in this crate touches the network or spawns processes; the only
//! I/O is reading a descriptor and writing the checksum sidecar.
//!
//! # Modules
//!
//! - [`locator`] - `ADDRESS[#REF][:SUBPATH]` parsing
//! - [`metadata`] - `addon.xml` parsing and id/version validation
//! - [`catalog`] - `addons.xml` generation
//! - [`checksum`] - `addons.xml.md5` digest
//! - [`error`] - error types for the above

pub mod catalog;
pub mod checksum;
pub mod error;
pub mod locator;
pub mod metadata;

pub use catalog::{CATALOG_FILE_NAME, Catalog};
pub use checksum::{CHECKSUM_FILE_NAME, Md5Digest};
pub use error::{DigestError, LocatorParseError, ValidationError};
pub use locator::PackageLocator;
pub use metadata::{DESCRIPTOR_FILE_NAME, PackageId, PackageMetadata, PackageVersion};
