//! Static asset copying — stage 3 of the build pipeline.
//!
//! Copies the favicon file, the images directory, and the structured-data
//! directory from the source tree into the output tree. Every candidate is
//! existence-checked first: absence is not an error, it is a silent skip.
//! That policy is deliberate — a site without a favicon or without JSON data
//! is a perfectly valid site — so nothing here is inferred from a failed
//! copy. Existing destination files are overwritten; content is never
//! transformed.

use crate::config::BuildConfig;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// One copied asset, for reporting.
#[derive(Debug)]
pub struct CopiedAsset {
    /// Source-relative name (`favicon.ico`, `images`, `json`).
    pub name: String,
    /// Number of files copied (1 for the favicon).
    pub files: usize,
}

/// Result summary for the asset stage. Skipped candidates are not recorded —
/// they are not an event.
#[derive(Debug)]
pub struct AssetReport {
    pub copied: Vec<CopiedAsset>,
}

/// Copy favicon, images directory, and data directory into `output_dir`,
/// skipping any that do not exist in `source_dir`.
pub fn copy(
    config: &BuildConfig,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<AssetReport, AssetError> {
    fs::create_dir_all(output_dir)?;
    let mut copied = Vec::new();

    let favicon = source_dir.join(&config.favicon);
    if favicon.is_file() {
        fs::copy(&favicon, output_dir.join(&config.favicon))?;
        copied.push(CopiedAsset {
            name: config.favicon.clone(),
            files: 1,
        });
    }

    for dir_name in [&config.images_dir, &config.data_dir] {
        let src = source_dir.join(dir_name);
        if src.is_dir() {
            let files = copy_dir_recursive(&src, &output_dir.join(dir_name))?;
            copied.push(CopiedAsset {
                name: dir_name.clone(),
                files,
            });
        }
    }

    Ok(AssetReport { copied })
}

/// Recursively copy `src` into `dst`, returning the number of files copied.
/// Directories are created as encountered; walkdir yields parents before
/// their contents.
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<usize, AssetError> {
    let mut files = 0;
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            files += 1;
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use tempfile::TempDir;

    #[test]
    fn absent_assets_are_silently_skipped() {
        let tmp = TempDir::new().unwrap();
        let config = BuildConfig::default();
        let out = tmp.path().join("local");
        let report = copy(&config, tmp.path(), &out).unwrap();
        assert!(report.copied.is_empty());
        assert!(out.is_dir());
        assert!(!out.join("favicon.ico").exists());
        assert!(!out.join("images").exists());
        assert!(!out.join("json").exists());
    }

    #[test]
    fn favicon_copied_when_present() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("favicon.ico"), b"icon-bytes").unwrap();
        let config = BuildConfig::default();
        let out = tmp.path().join("local");
        let report = copy(&config, tmp.path(), &out).unwrap();
        assert_eq!(report.copied.len(), 1);
        assert_eq!(report.copied[0].name, "favicon.ico");
        assert_eq!(fs::read(out.join("favicon.ico")).unwrap(), b"icon-bytes");
    }

    #[test]
    fn images_dir_copied_recursively_with_identical_content() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("images/photos")).unwrap();
        fs::write(tmp.path().join("images/logo.png"), b"logo").unwrap();
        fs::write(tmp.path().join("images/photos/one.jpg"), b"one").unwrap();
        let config = BuildConfig::default();
        let out = tmp.path().join("local");
        let report = copy(&config, tmp.path(), &out).unwrap();
        assert_eq!(report.copied.len(), 1);
        assert_eq!(report.copied[0].name, "images");
        assert_eq!(report.copied[0].files, 2);
        assert_eq!(fs::read(out.join("images/logo.png")).unwrap(), b"logo");
        assert_eq!(fs::read(out.join("images/photos/one.jpg")).unwrap(), b"one");
    }

    #[test]
    fn data_dir_copied_when_present() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("json")).unwrap();
        fs::write(tmp.path().join("json/schema.json"), b"{}").unwrap();
        let config = BuildConfig::default();
        let out = tmp.path().join("local");
        let report = copy(&config, tmp.path(), &out).unwrap();
        assert_eq!(report.copied.len(), 1);
        assert_eq!(report.copied[0].name, "json");
        assert_eq!(fs::read(out.join("json/schema.json")).unwrap(), b"{}");
    }

    #[test]
    fn existing_destination_files_overwritten() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("favicon.ico"), b"new").unwrap();
        let config = BuildConfig::default();
        let out = tmp.path().join("local");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("favicon.ico"), b"old").unwrap();
        copy(&config, tmp.path(), &out).unwrap();
        assert_eq!(fs::read(out.join("favicon.ico")).unwrap(), b"new");
    }
}
