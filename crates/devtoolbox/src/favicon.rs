//! Favicon set generation.
//!
//! One source image becomes PNG icons at every size in [`SIZES`], a
//! `favicon.ico`, a `site.webmanifest`, and an HTML snippet, bundled into a
//! zip archive.

use anyhow::{Context, Result};
use devtoolbox_core::error::{ConvertError, Format};
use devtoolbox_core::html_entities;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::{Cursor, Write};

use crate::config::FaviconConfig;

pub const SIZES: &[u32] = &[16, 32, 48, 64, 72, 96, 128, 144, 152, 192, 384, 512];

/// Size the `.ico` is built from.
const ICO_SIZE: u32 = 32;

/// Sizes listed in the web manifest.
const MANIFEST_SIZES: &[u32] = &[192, 512];

/// A generated file, named as it appears in the archive.
#[derive(Debug, Clone)]
pub struct FaviconFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

pub fn png_name(size: u32) -> String {
    format!("favicon-{}x{}.png", size, size)
}

/// Decode `source` and render the full icon set.
pub fn generate(source: &[u8], config: &FaviconConfig) -> Result<Vec<FaviconFile>, ConvertError> {
    if source.is_empty() {
        return Err(ConvertError::EmptyInput(Format::Image));
    }
    let img = image::load_from_memory(source).map_err(|e| ConvertError::parse(Format::Image, e))?;
    let (width, height) = img.dimensions();
    if width != height {
        tracing::warn!(width, height, "source image is not square; icons will be stretched");
    }

    let mut files = Vec::with_capacity(SIZES.len() + 3);
    let mut ico_source = None;
    for &size in SIZES {
        let icon = DynamicImage::ImageRgba8(
            img.resize_exact(size, size, FilterType::Triangle).to_rgba8(),
        );
        files.push(FaviconFile {
            name: png_name(size),
            bytes: encode(&icon, ImageFormat::Png)?,
        });
        if size == ICO_SIZE {
            ico_source = Some(icon);
        }
    }

    if let Some(icon) = ico_source {
        files.push(FaviconFile {
            name: "favicon.ico".to_string(),
            bytes: encode(&icon, ImageFormat::Ico)?,
        });
    }

    files.push(FaviconFile {
        name: "site.webmanifest".to_string(),
        bytes: manifest(config).into_bytes(),
    });
    files.push(FaviconFile {
        name: "favicon.html".to_string(),
        bytes: html_snippet(config).into_bytes(),
    });

    tracing::debug!(files = files.len(), width, height, "favicon set rendered");
    Ok(files)
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ConvertError> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)
        .map_err(|e| ConvertError::parse(Format::Image, e))?;
    Ok(out.into_inner())
}

pub fn manifest(config: &FaviconConfig) -> String {
    let icons: Vec<serde_json::Value> = MANIFEST_SIZES
        .iter()
        .map(|&size| {
            serde_json::json!({
                "src": format!("/{}", png_name(size)),
                "sizes": format!("{}x{}", size, size),
                "type": "image/png",
            })
        })
        .collect();
    let short_name = config.short_name.as_deref().unwrap_or(&config.app_name);

    let doc = serde_json::json!({
        "name": config.app_name,
        "short_name": short_name,
        "icons": icons,
        "theme_color": config.theme_color,
        "background_color": config.background_color,
        "display": "standalone",
    });
    // Serializing a json! literal cannot fail.
    serde_json::to_string_pretty(&doc).unwrap_or_default()
}

pub fn html_snippet(config: &FaviconConfig) -> String {
    let mut html = String::new();
    html.push_str("<link rel=\"icon\" type=\"image/x-icon\" href=\"/favicon.ico\">\n");
    for size in [16, 32, 48] {
        html.push_str(&format!(
            "<link rel=\"icon\" type=\"image/png\" sizes=\"{0}x{0}\" href=\"/{1}\">\n",
            size,
            png_name(size)
        ));
    }
    html.push_str(&format!(
        "<link rel=\"apple-touch-icon\" sizes=\"152x152\" href=\"/{}\">\n",
        png_name(152)
    ));
    html.push_str("<link rel=\"manifest\" href=\"/site.webmanifest\">\n");
    html.push_str(&format!(
        "<meta name=\"theme-color\" content=\"{}\">\n",
        html_entities::escape(&config.theme_color)
    ));
    html
}

/// Pack generated files into a zip archive.
pub fn to_zip(files: &[FaviconFile]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for file in files {
            zip.start_file(file.name.as_str(), options)
                .with_context(|| format!("Failed to add {} to archive", file.name))?;
            zip.write_all(&file.bytes)?;
        }
        zip.finish().context("Failed to finish favicon archive")?;
    }
    Ok(buf)
}

/// [`generate`] followed by [`to_zip`].
pub fn generate_zip(source: &[u8], config: &FaviconConfig) -> Result<Vec<u8>> {
    let files = generate(source, config)?;
    to_zip(&files)
}
