//! Resize, watermark and re-encode one image
//!
//! Output lands at `output_root/<relative path>`, keeping the input file name
//! so two inputs can never map to the same output. Missing output
//! directories are created before the input is decoded.

use crate::config::{EncodeFormat, TransformConfig};
use crate::discovery::WorkItem;
use crate::error::{TransformError, TransformResult};
use crate::transform::watermark;
use crate::transform::Transform;
use image::imageops::FilterType;
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Production transform backed by the `image` crate
#[derive(Debug, Clone)]
pub struct ImageTransform {
    config: TransformConfig,
    output_root: PathBuf,
}

impl ImageTransform {
    pub fn new(config: TransformConfig, output_root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_root: output_root.into(),
        }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Where the output for `item` is written
    pub fn output_path(&self, item: &WorkItem) -> PathBuf {
        self.output_root.join(item.relative_path())
    }

    /// Resize and watermark a decoded image
    pub fn render(&self, img: &DynamicImage) -> DynamicImage {
        let resized = img.resize_exact(self.config.width, self.config.height, FilterType::Lanczos3);
        let mut rgba = resized.to_rgba8();

        let (width, height) = rgba.dimensions();
        let (dx, dy) = self.config.watermark_offset;
        let origin = (width.saturating_sub(dx), height.saturating_sub(dy));
        watermark::stamp(
            &mut rgba,
            &self.config.watermark_text,
            origin,
            self.config.watermark_color,
        );

        DynamicImage::ImageRgba8(rgba)
    }

    fn encode(&self, img: DynamicImage, output: &Path) -> TransformResult<()> {
        // JPEG has no alpha channel
        let img = match self.config.format {
            EncodeFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
            EncodeFormat::Png => img,
        };

        img.save_with_format(output, self.config.format.image_format())
            .map_err(|e| TransformError::Encode {
                path: output.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

impl Transform for ImageTransform {
    fn apply(&self, item: &WorkItem) -> TransformResult<()> {
        let output = self.output_path(item);

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| TransformError::CreateDir {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let img = image::open(item.path()).map_err(|e| TransformError::Decode {
            path: item.path().to_path_buf(),
            reason: e.to_string(),
        })?;

        let rendered = self.render(&img);
        self.encode(rendered, &output)
    }
}
