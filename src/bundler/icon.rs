//! Executable icon preparation.
//!
//! Targets may name an `.ico` file, used as-is, or a `.png` image that is
//! converted to a multi-size ICO in the target's work directory. An icon that
//! is missing or unusable is reported and the build carries on without one.

use crate::bundler::error::{Error, ErrorExt, Result};
use ico::{IconDir, IconDirEntry, IconImage, ResourceType};
use image::imageops::FilterType;
use std::path::{Path, PathBuf};

/// Windows standard icon sizes, taskbar through high-res explorer view.
const ICO_SIZES: [u32; 7] = [16, 24, 32, 48, 64, 128, 256];

/// Resolve the icon a target should embed.
///
/// Returns `None`, after a warning, when the icon is absent or cannot be used.
pub fn prepare_icon(icon: Option<&Path>, work_dir: &Path) -> Option<PathBuf> {
    let icon = icon?;

    if !icon.is_file() {
        log::warn!(
            "Icon {} not found, building without an icon",
            icon.display()
        );
        return None;
    }

    let extension = icon
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("ico") => Some(icon.to_path_buf()),
        Some("png") => {
            let stem = icon
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("icon");
            let output = work_dir.join(format!("{stem}.ico"));
            match create_ico_file(icon, &output) {
                Ok(()) => Some(output),
                Err(e) => {
                    log::warn!(
                        "Could not convert {} to ICO ({}), building without an icon",
                        icon.display(),
                        e
                    );
                    None
                }
            }
        }
        _ => {
            log::warn!(
                "Unsupported icon format {}, expected .ico or .png",
                icon.display()
            );
            None
        }
    }
}

/// Create an ICO file from a single source image.
///
/// Sizes larger than the source are skipped; the source is resized down for
/// every other standard size.
pub fn create_ico_file(source: &Path, output: &Path) -> Result<()> {
    let img = image::open(source)?;
    let max_side = img.width().min(img.height());
    let rgba = img.to_rgba8();

    let mut icon_dir = IconDir::new(ResourceType::Icon);
    for size in ICO_SIZES.into_iter().filter(|s| *s <= max_side.max(16)) {
        log::debug!("Adding {}x{} from {}", size, size, source.display());
        let resized = image::imageops::resize(&rgba, size, size, FilterType::Lanczos3);
        let icon_image = IconImage::from_rgba_data(size, size, resized.into_raw());
        let entry = IconDirEntry::encode(&icon_image).map_err(|e| {
            Error::GenericError(format!("encoding {}x{} icon: {}", size, size, e))
        })?;
        icon_dir.add_entry(entry);
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).fs_context("creating icon directory", parent)?;
    }
    let file = std::fs::File::create(output).fs_context("creating ICO output file", output)?;
    icon_dir
        .write(file)
        .map_err(|e| Error::GenericError(format!("writing ICO data: {}", e)))?;

    log::info!("Created ICO file: {}", output.display());
    Ok(())
}
