//! Runtime configuration parsed from environment variables.
//!
//! Every setting has a default; a variable that is missing or fails to parse
//! falls back to it.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_ARENA_WIDTH: u32 = 500;
pub const DEFAULT_ARENA_HEIGHT: u32 = 290;
pub const DEFAULT_ARENA_MARGIN: u32 = 3;
pub const DEFAULT_RESOLUTION: f64 = 0.01;
pub const DEFAULT_ROBOT_DIAMETER: f64 = 0.355;
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

pub const DEFAULT_POSE_TOPIC: &str = "real_pose";
pub const DEFAULT_INITIAL_POSE_TOPIC: &str = "initial_pose";
pub const DEFAULT_MAP_TOPIC: &str = "map";
pub const DEFAULT_MAP_METADATA_TOPIC: &str = "map_metadata";

/// Frame id stamped on every published occupancy grid.
pub const MAP_FRAME: &str = "map_frame";

/// Size of the blank arena shown before any map is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaConfig {
    /// Floor width in pixels, margin excluded.
    pub width: u32,
    /// Floor height in pixels, margin excluded.
    pub height: u32,
    /// Black border thickness in pixels.
    pub margin: u32,
    /// Metres per pixel.
    pub resolution: f64,
}

/// Topic names used on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// Live robot pose (subscribed).
    pub pose: String,
    /// Initial-pose requests (published, not latched).
    pub initial_pose: String,
    /// Occupancy grid (published, latched).
    pub map: String,
    /// Map metadata (published, latched).
    pub map_metadata: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            pose: DEFAULT_POSE_TOPIC.into(),
            initial_pose: DEFAULT_INITIAL_POSE_TOPIC.into(),
            map: DEFAULT_MAP_TOPIC.into(),
            map_metadata: DEFAULT_MAP_METADATA_TOPIC.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub arena: ArenaConfig,
    /// Robot footprint diameter in metres.
    pub robot_diameter: f64,
    /// Per-subscriber queue depth on the bus.
    pub queue_capacity: usize,
    pub topics: Topics,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `WORLDSTATE_ARENA_WIDTH`, `WORLDSTATE_ARENA_HEIGHT`: default 500 x 290
    /// - `WORLDSTATE_ARENA_MARGIN`: default 3
    /// - `WORLDSTATE_RESOLUTION`: default 0.01
    /// - `WORLDSTATE_ROBOT_DIAMETER`: default 0.355
    /// - `WORLDSTATE_QUEUE_CAPACITY`: default 64
    /// - `WORLDSTATE_POSE_TOPIC`, `WORLDSTATE_INITIAL_POSE_TOPIC`,
    ///   `WORLDSTATE_MAP_TOPIC`, `WORLDSTATE_MAP_METADATA_TOPIC`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str, default| env_parse(&lookup, key, default);
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);
        let defaults = Topics::default();

        let arena = ArenaConfig {
            width: parse("WORLDSTATE_ARENA_WIDTH", DEFAULT_ARENA_WIDTH),
            height: parse("WORLDSTATE_ARENA_HEIGHT", DEFAULT_ARENA_HEIGHT),
            margin: parse("WORLDSTATE_ARENA_MARGIN", DEFAULT_ARENA_MARGIN),
            resolution: positive_or(
                env_parse(&lookup, "WORLDSTATE_RESOLUTION", DEFAULT_RESOLUTION),
                DEFAULT_RESOLUTION,
            ),
        };

        Self {
            arena,
            robot_diameter: positive_or(
                env_parse(&lookup, "WORLDSTATE_ROBOT_DIAMETER", DEFAULT_ROBOT_DIAMETER),
                DEFAULT_ROBOT_DIAMETER,
            ),
            queue_capacity: env_parse(&lookup, "WORLDSTATE_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY).max(1),
            topics: Topics {
                pose: text("WORLDSTATE_POSE_TOPIC", defaults.pose),
                initial_pose: text("WORLDSTATE_INITIAL_POSE_TOPIC", defaults.initial_pose),
                map: text("WORLDSTATE_MAP_TOPIC", defaults.map),
                map_metadata: text("WORLDSTATE_MAP_METADATA_TOPIC", defaults.map_metadata),
            },
        }
    }
}

fn env_parse<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key).and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

/// Resolution and diameter must stay strictly positive and finite.
fn positive_or(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { default }
}
