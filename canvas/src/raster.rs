//! Map rasterization: burn walls into the background and derive occupancy.
//!
//! The stored background is never touched. Each rasterization draws every
//! wall onto a fresh copy, then maps gray levels to occupancy with
//! `100 - (p / 255) * 100`, truncated toward zero. White is free (0), black is
//! occupied (100). Output is row-major in image order, so cell (0, 0) is the
//! image's top-left pixel.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point as PixelPoint;
use imageproc::rect::Rect;
use tracing::debug;

use crate::consts::{FLOOR_COLOR, WALL_COLOR};
use crate::convert::Point;
use crate::doc::WallSegment;

/// Derived occupancy snapshot. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    /// Cells per row.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Metres per cell.
    pub resolution: f64,
    /// Metric position reported for the grid origin.
    pub origin: Point,
    /// Row-major occupancy values in `[0, 100]`.
    pub cells: Vec<u8>,
}

/// Draw `walls` onto a copy of `background` and convert it to occupancy.
#[must_use]
pub fn rasterize<'a>(
    background: &GrayImage,
    walls: impl IntoIterator<Item = &'a WallSegment>,
    resolution: f64,
) -> OccupancyGrid {
    let image = draw_walls(background, walls);
    let (width, height) = image.dimensions();
    OccupancyGrid {
        width,
        height,
        resolution,
        origin: Point::new(0.0, f64::from(height) * resolution),
        cells: image.pixels().map(|p| occupancy(p.0[0])).collect(),
    }
}

/// Copy `background` and stroke every wall onto the copy.
#[must_use]
pub fn draw_walls<'a>(background: &GrayImage, walls: impl IntoIterator<Item = &'a WallSegment>) -> GrayImage {
    let mut image = background.clone();
    for wall in walls {
        stroke_wall(&mut image, wall);
    }
    image
}

/// Occupancy value for a gray level.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn occupancy(intensity: u8) -> u8 {
    (100.0 - (f64::from(intensity) / 255.0) * 100.0) as u8
}

/// White floor of `width` x `height` pixels framed by a black border of
/// `margin` pixels on every side.
#[must_use]
pub fn blank_arena(width: u32, height: u32, margin: u32) -> GrayImage {
    let (full_w, full_h) = (width + 2 * margin, height + 2 * margin);
    GrayImage::from_fn(full_w, full_h, |x, y| {
        let inside = x >= margin && x < margin + width && y >= margin && y < margin + height;
        Luma([if inside { FLOOR_COLOR } else { WALL_COLOR }])
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn stroke_wall(image: &mut GrayImage, wall: &WallSegment) {
    let finite = |p: Point| p.x.is_finite() && p.y.is_finite();
    if !finite(wall.start) || !finite(wall.end) {
        debug!(x = wall.start.x, y = wall.start.y, "skipping wall with non-finite endpoint");
        return;
    }

    // Pixel casts are only safe once the segment lies near the image.
    let (width, height) = image.dimensions();
    let pad = f64::from(wall.thickness) + 1.0;
    let bounds = (Point::new(-pad, -pad), Point::new(f64::from(width) + pad, f64::from(height) + pad));
    let Some((start, end)) = clip_segment(wall.start, wall.end, bounds) else {
        return;
    };

    let color = Luma([wall.color]);
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    let length = dx.hypot(dy);

    if wall.thickness <= 1 {
        draw_line_segment_mut(image, (start.x as f32, start.y as f32), (end.x as f32, end.y as f32), color);
        return;
    }

    let half = f64::from(wall.thickness) / 2.0;

    // Zero-length walls still occupy a thickness-sized square.
    if length < f64::EPSILON {
        let corner = Rect::at((start.x - half).round() as i32, (start.y - half).round() as i32)
            .of_size(wall.thickness, wall.thickness);
        draw_filled_rect_mut(image, corner, color);
        return;
    }

    let (nx, ny) = (-dy / length * half, dx / length * half);
    let corner = |x: f64, y: f64| PixelPoint::new(x.round() as i32, y.round() as i32);
    let quad = [
        corner(start.x + nx, start.y + ny),
        corner(end.x + nx, end.y + ny),
        corner(end.x - nx, end.y - ny),
        corner(start.x - nx, start.y - ny),
    ];
    draw_polygon_mut(image, &quad, color);
}

/// Clip segment `a`-`b` to the box `(min, max)`, Liang-Barsky style.
///
/// Returns `None` when no part of the segment lies inside.
fn clip_segment(a: Point, b: Point, (min, max): (Point, Point)) -> Option<(Point, Point)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [(-dx, a.x - min.x), (dx, max.x - a.x), (-dy, a.y - min.y), (dy, max.y - a.y)] {
        if p.abs() < f64::EPSILON {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f64| Point::new(a.x + t * dx, a.y + t * dy);
    Some((at(t0), at(t1)))
}
