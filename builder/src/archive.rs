//! Package archiving and auxiliary-file staging.
//!
//! Each validated add-on becomes `staging/{id}/{id}-{version}.zip`, a deflate
//! archive whose entries are rooted at `{id}/`, plus copies of whichever
//! auxiliary files the working tree carries at its root.

use crate::error::ArchiveError;
use crate::fetch::FetchedSource;
use crate::staging::StagingArea;
use camino::{Utf8Path, Utf8PathBuf};
use kodi_repo_common::metadata::{DESCRIPTOR_FILE_NAME, PackageId, PackageMetadata};
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Files copied next to the archive when present at the working-tree root.
pub const AUXILIARY_FILES: [&str; 5] = [
    DESCRIPTOR_FILE_NAME,
    "changelog.txt",
    "icon.png",
    "fanart.jpg",
    "LICENSE.txt",
];

/// Version-control metadata (directory, or file in submodules) left out of
/// every archive.
const VCS_DIR_NAME: &str = ".git";

/// Result of writing one zip archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Path of the written archive.
    pub path: Utf8PathBuf,
    /// Number of file entries written.
    pub entries: usize,
}

/// Everything staged for one add-on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageArtefacts {
    /// The add-on id, also the name of its staging directory.
    pub id: PackageId,
    /// `staging/{id}`.
    pub package_dir: Utf8PathBuf,
    /// `staging/{id}/{id}-{version}.zip`.
    pub archive_path: Utf8PathBuf,
    /// Auxiliary files copied into the package directory, in
    /// [`AUXILIARY_FILES`] order.
    pub auxiliary_files: Vec<Utf8PathBuf>,
    /// Number of entries in the archive.
    pub archived_entries: usize,
}

impl PackageArtefacts {
    /// The same artefacts after their directory moved to `package_dir`.
    #[must_use]
    pub fn relocate(self, package_dir: Utf8PathBuf) -> Self {
        let Self {
            id,
            package_dir: old_dir,
            archive_path,
            auxiliary_files,
            archived_entries,
        } = self;
        let rebase = |path: &Utf8Path| match path.strip_prefix(&old_dir) {
            Ok(relative) => package_dir.join(relative),
            Err(_) => path.to_owned(),
        };
        let archive_path = rebase(archive_path.as_path());
        let auxiliary_files = auxiliary_files.iter().map(|path| rebase(path.as_path())).collect();
        Self {
            id,
            package_dir,
            archive_path,
            auxiliary_files,
            archived_entries,
        }
    }
}

/// File name of the archive for `metadata`: `{id}-{version}.zip`.
#[must_use]
pub fn archive_file_name(metadata: &PackageMetadata) -> String {
    format!("{}-{}.zip", metadata.id, metadata.version)
}

/// Archive and stage one fetched, validated add-on into the slot of the
/// worker at submission index `slot`.
///
/// The slot is promoted to `staging/{id}` by the orchestrator once every
/// worker has reported and ids are known to be unique.
///
/// # Errors
///
/// Returns [`ArchiveError`] if the slot cannot be created or archiving or
/// copying fails.
pub fn build_package(
    source: &FetchedSource,
    metadata: &PackageMetadata,
    staging: &StagingArea,
    slot: usize,
) -> Result<PackageArtefacts, ArchiveError> {
    let package_dir = staging.claim_slot(slot)?;
    let archive_path = package_dir.join(archive_file_name(metadata));

    let summary = source.archive_subtree(metadata.id.as_str(), &archive_path)?;
    let auxiliary_files = copy_auxiliary_files(source.working_tree(), &package_dir)?;

    debug!(
        "staged {} ({} entries, {} auxiliary files)",
        metadata.id,
        summary.entries,
        auxiliary_files.len()
    );

    Ok(PackageArtefacts {
        id: metadata.id.clone(),
        package_dir,
        archive_path: summary.path,
        auxiliary_files,
        archived_entries: summary.entries,
    })
}

/// Copy the present [`AUXILIARY_FILES`] from `working_tree` into `dest_dir`.
///
/// Missing files are skipped.
///
/// # Errors
///
/// Returns [`ArchiveError::Io`] if a present file cannot be copied.
pub fn copy_auxiliary_files(
    working_tree: &Utf8Path,
    dest_dir: &Utf8Path,
) -> Result<Vec<Utf8PathBuf>, ArchiveError> {
    let mut copied = Vec::new();
    for name in AUXILIARY_FILES {
        let from = working_tree.join(name);
        if !from.is_file() {
            continue;
        }
        let to = dest_dir.join(name);
        fs::copy(&from, &to).map_err(|source| ArchiveError::Io {
            path: from.clone(),
            source,
        })?;
        copied.push(to);
    }
    Ok(copied)
}

/// Write a deflate zip of every regular file under `source_root` to
/// `output`.
///
/// Entries are named `{prefix}/{relative path}` with `/` separators and are
/// written in sorted walk order. The `.git` directory is skipped. A symbolic
/// link to a regular file inside `source_root` is archived under the link's
/// own path with the target's content; any other link is skipped with a
/// warning. Unix permission bits are kept.
///
/// # Errors
///
/// Returns [`ArchiveError`] if the tree cannot be walked or read, or the
/// archive cannot be written.
pub fn create_zip_archive(
    source_root: &Utf8Path,
    prefix: &str,
    output: &Utf8Path,
) -> Result<ArchiveSummary, ArchiveError> {
    let file = fs::File::create(output).map_err(|source| ArchiveError::Io {
        path: output.to_owned(),
        source,
    })?;
    let mut writer = zip::ZipWriter::new(file);
    let mut entries = 0;
    let canonical_root = fs::canonicalize(source_root).map_err(|source| ArchiveError::Io {
        path: source_root.to_owned(),
        source,
    })?;

    let walker = WalkDir::new(source_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_vcs_dir(entry));

    for entry in walker {
        let entry = entry?;
        let file_type = entry.file_type();
        let metadata = if file_type.is_symlink() {
            match linked_file(&canonical_root, entry.path()) {
                Some(metadata) => metadata,
                None => {
                    warn!(
                        "skipping symbolic link {} (not a file inside the add-on)",
                        entry.path().display()
                    );
                    continue;
                }
            }
        } else if file_type.is_file() {
            entry.metadata()?
        } else {
            continue;
        };

        let path = utf8_path(entry.path())?;
        let name = entry_name(prefix, source_root, path);
        let options = file_options(&metadata);

        writer.start_file(name, options)?;
        let mut input = fs::File::open(path).map_err(|source| ArchiveError::Io {
            path: path.to_owned(),
            source,
        })?;
        io::copy(&mut input, &mut writer).map_err(|source| ArchiveError::Io {
            path: path.to_owned(),
            source,
        })?;
        entries += 1;
    }

    writer.finish()?;
    Ok(ArchiveSummary {
        path: output.to_owned(),
        entries,
    })
}

fn is_vcs_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name() == VCS_DIR_NAME
}

/// Metadata of the regular file `link` resolves to, if it lies inside
/// `canonical_root`.
fn linked_file(canonical_root: &Path, link: &Path) -> Option<fs::Metadata> {
    let target = fs::canonicalize(link).ok()?;
    if !target.starts_with(canonical_root) {
        return None;
    }
    let metadata = fs::metadata(&target).ok()?;
    metadata.is_file().then_some(metadata)
}

fn utf8_path(path: &Path) -> Result<&Utf8Path, ArchiveError> {
    Utf8Path::from_path(path).ok_or_else(|| ArchiveError::NonUtf8Path {
        path: path.to_path_buf(),
    })
}

/// `{prefix}/a/b.txt` for `source_root/a/b.txt`, whatever the platform
/// separator.
fn entry_name(prefix: &str, source_root: &Utf8Path, path: &Utf8Path) -> String {
    let relative = path.strip_prefix(source_root).unwrap_or(path);
    let mut name = prefix.to_owned();
    for component in relative.components() {
        name.push('/');
        name.push_str(component.as_str());
    }
    name
}

fn file_options(metadata: &fs::Metadata) -> SimpleFileOptions {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        options.unix_permissions(metadata.permissions().mode())
    }

    #[cfg(not(unix))]
    {
        let _ = metadata;
        options
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
