//! Map descriptor loading.
//!
//! A descriptor is a small YAML document naming a grayscale map image, its
//! resolution in metres per pixel, and the metric position of the image's
//! bottom-left corner:
//!
//! ```yaml
//! image: arena.png
//! resolution: 0.01
//! origin: [0.0, 0.0, 0.0]
//! ```
//!
//! Other keys commonly found in such files (`negate`, `occupied_thresh`,
//! `free_thresh`, ...) are ignored. Loading either yields a complete
//! [`LoadedMap`] or an error; nothing is partially applied.

#[cfg(test)]
#[path = "descriptor_test.rs"]
mod descriptor_test;

use std::path::{Path, PathBuf};

use canvas::convert::CoordinateConverter;
use image::GrayImage;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum MapLoadError {
    #[error("failed to read map descriptor {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid map descriptor: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("map resolution must be positive and finite, got {0}")]
    InvalidResolution(f64),
    #[error("map origin needs at least 2 values, got {0}")]
    OriginTooShort(usize),
    #[error("failed to load map image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Parsed and validated descriptor contents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapDescriptor {
    /// Image path, absolute or relative to the descriptor's directory.
    pub image: PathBuf,
    /// Metres per pixel.
    pub resolution: f64,
    /// Metric `[x, y, ...]` of the image's bottom-left corner.
    pub origin: Vec<f64>,
}

impl MapDescriptor {
    /// Parse and validate descriptor YAML.
    pub fn from_yaml(text: &str) -> Result<Self, MapLoadError> {
        let descriptor: Self = serde_yaml::from_str(text)?;
        if !(descriptor.resolution.is_finite() && descriptor.resolution > 0.0) {
            return Err(MapLoadError::InvalidResolution(descriptor.resolution));
        }
        if descriptor.origin.len() < 2 {
            return Err(MapLoadError::OriginTooShort(descriptor.origin.len()));
        }
        Ok(descriptor)
    }

    /// Metric `(x, y)` of the image's bottom-left corner.
    #[must_use]
    pub fn origin_xy(&self) -> (f64, f64) {
        let at = |i: usize| self.origin.get(i).copied().unwrap_or(0.0);
        (at(0), at(1))
    }

    /// Locate the image for a descriptor read from `descriptor_path`.
    ///
    /// Absolute paths are used as-is. For relative paths only the file name
    /// is kept and looked up next to the descriptor.
    #[must_use]
    pub fn resolve_image_path(&self, descriptor_path: &Path) -> PathBuf {
        if self.image.is_absolute() {
            return self.image.clone();
        }
        let dir = descriptor_path.parent().unwrap_or_else(|| Path::new(""));
        match self.image.file_name() {
            Some(name) => dir.join(name),
            None => dir.join(&self.image),
        }
    }
}

/// Everything needed to swap a new map into the editor.
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub source: PathBuf,
    pub image: GrayImage,
    pub converter: CoordinateConverter,
    pub robot_radius_px: f64,
}

/// Read the descriptor at `path` and decode its image.
pub fn load(path: &Path, robot_diameter: f64) -> Result<LoadedMap, MapLoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| MapLoadError::Read { path: path.to_path_buf(), source })?;
    let descriptor = MapDescriptor::from_yaml(&text)?;

    let image_path = descriptor.resolve_image_path(path);
    let image = image::open(&image_path)
        .map_err(|source| MapLoadError::Image { path: image_path.clone(), source })?
        .into_luma8();

    let (origin_x, origin_y) = descriptor.origin_xy();
    let converter = CoordinateConverter::from_map_origin(origin_x, origin_y, descriptor.resolution, image.height());
    let robot_radius_px = robot_radius_px(robot_diameter, descriptor.resolution);

    info!(
        path = %path.display(),
        image = %image_path.display(),
        width = image.width(),
        height = image.height(),
        resolution = descriptor.resolution,
        origin_x,
        origin_y,
        "map descriptor loaded"
    );
    Ok(LoadedMap { source: path.to_path_buf(), image, converter, robot_radius_px })
}

/// Marker radius in whole pixels for a robot of `diameter` metres.
#[must_use]
pub fn robot_radius_px(diameter: f64, resolution: f64) -> f64 {
    ((diameter / 2.0) / resolution).floor()
}
