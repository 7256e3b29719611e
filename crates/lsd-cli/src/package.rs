//! Publication package access.
//!
//! An LCP-protected publication is a ZIP container carrying its License
//! Document at `META-INF/license.lcpl`.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use lsd_core::{DocumentError, LicenseDocument};
use zip::result::ZipError;
use zip::ZipArchive;

/// Where the License Document lives inside a publication.
pub const LICENSE_ENTRY: &str = "META-INF/license.lcpl";

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not a readable ZIP archive: {source}", .path.display())]
    Archive { path: PathBuf, source: ZipError },

    #[error("package has no {entry} entry")]
    MissingEntry { entry: String },

    #[error("cannot read {entry}: {source}")]
    Read {
        entry: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DocumentError),
}

/// Read and decode the License Document stored at `entry` in the package
/// at `path`.
pub fn read_license(path: &Path, entry: &str) -> Result<LicenseDocument, PackageError> {
    let file = File::open(path).map_err(|source| PackageError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let archive_error = |source: ZipError| PackageError::Archive {
        path: path.to_path_buf(),
        source,
    };

    let mut archive = ZipArchive::new(file).map_err(archive_error)?;
    let mut license = match archive.by_name(entry) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => {
            return Err(PackageError::MissingEntry {
                entry: entry.to_string(),
            })
        }
        Err(e) => return Err(archive_error(e)),
    };

    let mut text = String::new();
    license
        .read_to_string(&mut text)
        .map_err(|source| PackageError::Read {
            entry: entry.to_string(),
            source,
        })?;
    tracing::debug!(package = %path.display(), entry, bytes = text.len(), "read license entry");
    Ok(LicenseDocument::from_json(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const LICENSE: &str = r#"{
        "id": "lic-1",
        "updated": "2016-07-01T00:00:00Z",
        "links": {"status": {"href": "http://lsd.test/status/1"}}
    }"#;

    fn package(entries: &[(&str, &str)]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut zip = ZipWriter::new(file.as_file_mut());
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        file
    }

    #[test]
    fn reads_license_entry() {
        let pkg = package(&[("mimetype", "application/epub+zip"), (LICENSE_ENTRY, LICENSE)]);
        let license = read_license(pkg.path(), LICENSE_ENTRY).unwrap();
        assert_eq!(license.id.as_deref(), Some("lic-1"));
        assert_eq!(license.status_link().unwrap().href, "http://lsd.test/status/1");
    }

    #[test]
    fn missing_entry() {
        let pkg = package(&[("mimetype", "application/epub+zip")]);
        let err = read_license(pkg.path(), LICENSE_ENTRY).unwrap_err();
        assert!(matches!(err, PackageError::MissingEntry { .. }), "{err}");
    }

    #[test]
    fn not_a_zip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"plain text").unwrap();
        let err = read_license(file.path(), LICENSE_ENTRY).unwrap_err();
        assert!(matches!(err, PackageError::Archive { .. }), "{err}");
    }

    #[test]
    fn invalid_json() {
        let pkg = package(&[(LICENSE_ENTRY, "{not json")]);
        let err = read_license(pkg.path(), LICENSE_ENTRY).unwrap_err();
        assert!(matches!(err, PackageError::Decode(_)), "{err}");
    }

    #[test]
    fn missing_file() {
        let err = read_license(Path::new("/nonexistent/book.epub"), LICENSE_ENTRY).unwrap_err();
        assert!(matches!(err, PackageError::Open { .. }));
    }
}
