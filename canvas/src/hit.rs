#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::HIT_SLOP_PX;
use crate::convert::Point;
use crate::doc::{CanvasModel, RobotMarker, WallId, WallSegment};

/// The entity found under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    /// The robot disc or its heading line.
    Robot,
    /// A wall segment.
    Wall(WallId),
}

/// Return the topmost entity under `pt`, or `None` for bare background.
///
/// Entities are stacked in creation order, so the candidate with the highest
/// z-index wins.
#[must_use]
pub fn hit_test(pt: Point, doc: &CanvasModel) -> Option<Hit> {
    let robot = doc
        .robot()
        .filter(|marker| robot_hit(marker, pt))
        .map(|marker| (marker.z_index, Hit::Robot));

    let wall = doc
        .walls_in_draw_order()
        .into_iter()
        .rev()
        .find(|wall| wall_hit(wall, pt))
        .map(|wall| (wall.z_index, Hit::Wall(wall.id.clone())));

    match (robot, wall) {
        (Some((rz, r)), Some((wz, w))) => Some(if rz > wz { r } else { w }),
        (Some((_, r)), None) => Some(r),
        (None, Some((_, w))) => Some(w),
        (None, None) => None,
    }
}

fn robot_hit(marker: &RobotMarker, pt: Point) -> bool {
    marker.contains(pt) || distance_to_segment(pt, marker.center, marker.heading_point) <= HIT_SLOP_PX
}

fn wall_hit(wall: &WallSegment, pt: Point) -> bool {
    let reach = f64::from(wall.thickness) / 2.0 + HIT_SLOP_PX;
    distance_to_segment(pt, wall.start, wall.end) <= reach
}

/// Shortest distance from `p` to the segment from `a` to `b`.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return (p.x - a.x).hypot(p.y - a.y);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    (p.x - cx).hypot(p.y - cy)
}
