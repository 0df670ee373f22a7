#[cfg(test)]
#[path = "convert_test.rs"]
mod convert_test;

use serde::Serialize;

/// A point in either pixel or metric space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel/metric transform for one loaded map.
///
/// `origin_x` / `origin_y` are the metric coordinates of pixel (0, 0), the
/// image's top-left corner. `resolution` is metres per pixel. Pixel y grows
/// downward, so metric y shrinks as the row index grows.
///
/// The caller guarantees `resolution > 0`. A new converter is built whenever
/// a map is loaded; it is never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinateConverter {
    origin_x: f64,
    origin_y: f64,
    resolution: f64,
}

impl CoordinateConverter {
    /// Converter anchored at the metric position of the image's top-left pixel.
    #[must_use]
    pub fn new(origin_x: f64, origin_y: f64, resolution: f64) -> Self {
        Self { origin_x, origin_y, resolution }
    }

    /// Converter for a map whose `origin` is the metric position of the
    /// image's bottom-left corner, as map descriptors record it.
    #[must_use]
    pub fn from_map_origin(origin_x: f64, origin_y: f64, resolution: f64, height_px: u32) -> Self {
        Self::new(origin_x, origin_y + f64::from(height_px) * resolution, resolution)
    }

    /// Convert a pixel-space point to metric coordinates.
    #[must_use]
    pub fn pixel_to_metric(&self, pixel: Point) -> Point {
        Point {
            x: self.origin_x + pixel.x * self.resolution,
            y: self.origin_y - pixel.y * self.resolution,
        }
    }

    /// Convert a metric point to pixel coordinates.
    #[must_use]
    pub fn metric_to_pixel(&self, metric: Point) -> Point {
        Point {
            x: (metric.x - self.origin_x) / self.resolution,
            y: (self.origin_y - metric.y) / self.resolution,
        }
    }

    /// Metres per pixel.
    #[must_use]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }
}
