//! Canvas model: the background map, the robot marker, and wall segments.
//!
//! This module defines the drawable entities the editor manipulates
//! (`RobotMarker`, `WallSegment`) and the store that owns them
//! (`CanvasModel`). Every entity receives a z-index from a single counter when
//! it is first created, so draw order equals creation order and the hit-tester
//! can always pick a unique topmost entity. Replacing the background starts a
//! fresh model: marker and walls are discarded and the counter restarts.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use image::GrayImage;
use serde::Serialize;

use crate::consts::{WALL_COLOR, WALL_THICKNESS_PX};
use crate::convert::Point;

/// Identifier of a wall segment, e.g. `"wall_3"`.
pub type WallId = String;

/// Build the identifier for the wall created in add-session `counter`.
#[must_use]
pub fn wall_id(counter: u64) -> WallId {
    format!("wall_{counter}")
}

/// A straight wall drawn by the operator, in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WallSegment {
    /// Stable identifier; never reused within a process lifetime.
    pub id: WallId,
    /// Anchor where the pointer went down.
    pub start: Point,
    /// Free endpoint that follows the pointer while dragging.
    pub end: Point,
    /// Stroke width in pixels.
    pub thickness: u32,
    /// Gray level the wall is drawn with.
    pub color: u8,
    /// Stacking order; higher values are drawn above lower values.
    pub z_index: u64,
}

/// The robot's on-canvas marker: a disc plus a heading line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RobotMarker {
    /// Disc center in pixel space.
    pub center: Point,
    /// End of the heading line, one radius away from `center`.
    pub heading_point: Point,
    /// Disc radius in pixels.
    pub radius: f64,
    /// Stacking order; higher values are drawn above lower values.
    pub z_index: u64,
}

impl RobotMarker {
    /// Heading in radians, counter-clockwise from the +x axis in metric terms.
    ///
    /// Pixel y grows downward, so the y delta is negated.
    #[must_use]
    pub fn heading(&self) -> f64 {
        heading_between(self.center, self.heading_point)
    }

    /// Point the heading line at `yaw` radians, keeping the center fixed.
    pub fn point_towards(&mut self, yaw: f64) {
        self.heading_point = Point {
            x: self.center.x + self.radius * yaw.cos(),
            y: self.center.y - self.radius * yaw.sin(),
        };
    }

    /// Move disc and heading line together.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.center.x += dx;
        self.center.y += dy;
        self.heading_point.x += dx;
        self.heading_point.y += dy;
    }

    /// Whether `pt` lies on the disc.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        (pt.x - self.center.x).hypot(pt.y - self.center.y) <= self.radius
    }
}

/// Heading of `to` as seen from `from`, with pixel y pointing down.
#[must_use]
pub fn heading_between(from: Point, to: Point) -> f64 {
    (-(to.y - from.y)).atan2(to.x - from.x)
}

/// In-memory store of everything drawn on the canvas.
pub struct CanvasModel {
    background: GrayImage,
    robot: Option<RobotMarker>,
    walls: HashMap<WallId, WallSegment>,
    next_z: u64,
}

impl CanvasModel {
    /// Create a model with `background` and no marker or walls.
    #[must_use]
    pub fn new(background: GrayImage) -> Self {
        Self { background, robot: None, walls: HashMap::new(), next_z: 0 }
    }

    /// The active background image. Never modified by editing.
    #[must_use]
    pub fn background(&self) -> &GrayImage {
        &self.background
    }

    /// Swap in a new background and discard the marker and every wall.
    pub fn replace_background(&mut self, background: GrayImage) {
        self.background = background;
        self.robot = None;
        self.walls.clear();
        self.next_z = 0;
    }

    /// The robot marker, if a pose has been received yet.
    #[must_use]
    pub fn robot(&self) -> Option<&RobotMarker> {
        self.robot.as_ref()
    }

    /// Mutable access to the robot marker.
    pub fn robot_mut(&mut self) -> Option<&mut RobotMarker> {
        self.robot.as_mut()
    }

    /// Place the robot marker at `center` facing `yaw`.
    ///
    /// The marker is created on first use; later calls update it in place
    /// and keep its original stacking order.
    pub fn place_robot(&mut self, center: Point, yaw: f64, radius: f64) -> &RobotMarker {
        let z_index = match self.robot {
            Some(existing) => existing.z_index,
            None => self.bump_z(),
        };
        let mut marker = RobotMarker { center, heading_point: center, radius, z_index };
        marker.point_towards(yaw);
        self.robot.insert(marker)
    }

    /// Create a zero-length wall anchored at `start` with the default style.
    ///
    /// An existing wall with the same id is replaced.
    pub fn add_wall(&mut self, id: WallId, start: Point) -> &WallSegment {
        let z_index = self.bump_z();
        let wall = WallSegment {
            id: id.clone(),
            start,
            end: start,
            thickness: WALL_THICKNESS_PX,
            color: WALL_COLOR,
            z_index,
        };
        self.walls.insert(id.clone(), wall);
        &self.walls[&id]
    }

    /// Return a wall by id.
    #[must_use]
    pub fn wall(&self, id: &str) -> Option<&WallSegment> {
        self.walls.get(id)
    }

    /// Mutable access to a wall by id.
    pub fn wall_mut(&mut self, id: &str) -> Option<&mut WallSegment> {
        self.walls.get_mut(id)
    }

    /// Remove a wall by id, returning it if it was present.
    pub fn remove_wall(&mut self, id: &str) -> Option<WallSegment> {
        self.walls.remove(id)
    }

    /// All walls sorted by `(z_index, id)` for draw order.
    #[must_use]
    pub fn walls_in_draw_order(&self) -> Vec<&WallSegment> {
        let mut walls: Vec<&WallSegment> = self.walls.values().collect();
        walls.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
        walls
    }

    /// Number of walls currently on the canvas.
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    fn bump_z(&mut self) -> u64 {
        let z = self.next_z;
        self.next_z += 1;
        z
    }
}
