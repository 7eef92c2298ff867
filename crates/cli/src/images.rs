//! Persist contact images to a directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use contactlog_core::{ContactRecord, Diagnostic, codes};

/// What [`save_images`] did.
#[derive(Debug, Default)]
pub(crate) struct ImageSummary {
    /// Files created, in record order.
    pub(crate) written: Vec<PathBuf>,
    /// Skipped images (already present or not valid base64).
    pub(crate) diagnostics: Vec<Diagnostic>,
}

/// Decode each record's base64 image and write it to
/// `<dir>/<file stem>.<extension>`.
///
/// The directory is created when missing. Existing files are never
/// overwritten. I/O failures abort; bad payloads and existing files are
/// reported as diagnostics.
pub(crate) fn save_images(
    records: &[ContactRecord],
    dir: &Path,
    extension: &str,
) -> Result<ImageSummary> {
    let mut summary = ImageSummary::default();
    let with_images: Vec<_> = records
        .iter()
        .filter_map(|r| r.image().map(|img| (r, img)))
        .collect();
    if with_images.is_empty() {
        return Ok(summary);
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create image directory '{}'", dir.display()))?;

    for (record, image) in with_images {
        let path = dir.join(record.image_file_name(extension));
        if path.exists() {
            summary.diagnostics.push(
                Diagnostic::info(
                    codes::IMAGE_EXISTS,
                    format!("{} already exists; not overwritten", path.display()),
                    None,
                )
                .with_context(image_context(record, &path)),
            );
            continue;
        }

        let bytes = match image.decode_base64() {
            Ok(bytes) => bytes,
            Err(err) => {
                summary.diagnostics.push(
                    Diagnostic::warn(
                        codes::INVALID_IMAGE_DATA,
                        format!("contact {}: image is not valid base64 ({err})", record.id()),
                        None,
                    )
                    .with_context(image_context(record, &path)),
                );
                continue;
            }
        };

        fs::write(&path, bytes)
            .with_context(|| format!("failed to write image '{}'", path.display()))?;
        summary.written.push(path);
    }

    Ok(summary)
}

fn image_context(record: &ContactRecord, path: &Path) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("entity".to_string(), record.id().to_string()),
        ("path".to_string(), path.display().to_string()),
    ])
}
