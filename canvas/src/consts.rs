//! Shared numeric constants for the canvas crate.

// ── Walls ───────────────────────────────────────────────────────

/// Stroke width of a newly drawn wall, in pixels.
pub const WALL_THICKNESS_PX: u32 = 3;

/// Gray level of a newly drawn wall (black).
pub const WALL_COLOR: u8 = 0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Extra pixels around thin strokes that still count as a hit.
pub const HIT_SLOP_PX: f64 = 1.0;

// ── Blank arena ─────────────────────────────────────────────────

/// Gray level of open floor in the blank arena.
pub const FLOOR_COLOR: u8 = 255;
