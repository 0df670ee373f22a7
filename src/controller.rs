//! World-state controller: owns the editing engine and talks to the transport.
//!
//! DESIGN
//! ======
//! The canvas engine is pure. It returns [`Action`]s and this controller
//! carries out the ones that leave the process: `MapChanged` re-rasterizes
//! and publishes the grid, `PublishPose` converts the marker pose to metric
//! space and sends it as an initial-pose request. Cursor and redraw actions
//! are handed back to the front-end untouched.
//!
//! Transport failures are logged and otherwise ignored; they never roll back
//! or block an edit.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use canvas::convert::{CoordinateConverter, Point};
use canvas::engine::{Action, Engine, PixelPose};
use canvas::input::{Key, Mode};
use canvas::raster;
use msgs::{Header, MapMetaData, OccupancyGrid, Pose, Timestamp};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, MAP_FRAME};
use crate::descriptor::{self, LoadedMap, MapLoadError};
use crate::transport::Transport;

/// Snapshot of controller state for the `status` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub mode: Mode,
    pub map: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub resolution: f64,
    pub walls: usize,
    pub next_wall: u64,
    pub robot: Option<MetricPose>,
    pub shut_down: bool,
}

/// A planar pose in metric space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricPose {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

pub struct WorldStateController<T: Transport> {
    engine: Engine,
    transport: T,
    robot_diameter: f64,
    map_source: Option<PathBuf>,
    shut_down: bool,
}

impl<T: Transport> WorldStateController<T> {
    /// Start on the blank arena described by `config`. Nothing is published
    /// until [`update_map`](Self::update_map) is called.
    pub fn new(transport: T, config: &AppConfig) -> Self {
        let arena = config.arena;
        let background = raster::blank_arena(arena.width, arena.height, arena.margin);
        let converter = CoordinateConverter::from_map_origin(0.0, 0.0, arena.resolution, background.height());
        let radius = descriptor::robot_radius_px(config.robot_diameter, arena.resolution);
        info!(
            width = background.width(),
            height = background.height(),
            resolution = arena.resolution,
            "blank arena ready"
        );
        Self {
            engine: Engine::new(background, converter, radius),
            transport,
            robot_diameter: config.robot_diameter,
            map_source: None,
            shut_down: false,
        }
    }

    // --- Front-end events ---

    pub fn on_pointer_down(&mut self, pt: Point) -> Vec<Action> {
        let actions = self.engine.on_pointer_down(pt);
        self.dispatch(actions)
    }

    pub fn on_pointer_drag(&mut self, pt: Point) -> Vec<Action> {
        let actions = self.engine.on_pointer_drag(pt);
        self.dispatch(actions)
    }

    pub fn on_pointer_up(&mut self, pt: Point) -> Vec<Action> {
        let actions = self.engine.on_pointer_up(pt);
        self.dispatch(actions)
    }

    pub fn on_key(&mut self, key: &Key) -> Vec<Action> {
        let actions = self.engine.on_key(key);
        self.dispatch(actions)
    }

    /// Handle the result of an "open map" file picker. `None` means the
    /// operator cancelled and nothing changes.
    pub fn open_map(&mut self, path: Option<&Path>) -> Result<Vec<Action>, MapLoadError> {
        let Some(path) = path else {
            debug!("map open cancelled");
            return Ok(Vec::new());
        };
        self.load_map(path)
    }

    /// Load the descriptor at `path` and make it the active map.
    ///
    /// The converter, background and model are replaced together only after
    /// the descriptor and image decode cleanly. On error nothing changes.
    pub fn load_map(&mut self, path: &Path) -> Result<Vec<Action>, MapLoadError> {
        let loaded = descriptor::load(path, self.robot_diameter).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "map load rejected");
        })?;
        Ok(self.install_map(loaded))
    }

    fn install_map(&mut self, map: LoadedMap) -> Vec<Action> {
        let LoadedMap { source, image, converter, robot_radius_px } = map;
        info!(path = %source.display(), robot_radius_px, "map installed");
        self.map_source = Some(source);
        let actions = self.engine.load_map(image, converter, robot_radius_px);
        self.dispatch(actions)
    }

    /// Apply a live pose from the robot.
    pub fn on_live_pose(&mut self, pose: &Pose) -> Vec<Action> {
        let actions = self.engine.apply_live_pose(pose.x(), pose.y(), pose.yaw());
        self.dispatch(actions)
    }

    /// Tell downstream consumers the robot's pose is unknown.
    ///
    /// Sends `(inf, inf, 0)` straight through, independent of the active map.
    pub fn reset(&mut self) {
        info!("reset: publishing unknown pose");
        self.publish_pose(&Pose::planar(f64::INFINITY, f64::INFINITY, 0.0));
    }

    /// Stop the controller and release the transport.
    ///
    /// Returns `true` the first time only; later calls do nothing.
    pub fn shutdown(&mut self) -> bool {
        if self.shut_down {
            return false;
        }
        self.shut_down = true;
        self.transport.close();
        info!("world state controller shut down");
        true
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    // --- Publishing ---

    /// Rasterize the current canvas and publish metadata plus grid.
    pub fn update_map(&mut self) {
        let grid = self.engine.rasterize();
        let now = Timestamp::from(SystemTime::now());
        let metadata = MapMetaData {
            map_load_time: Some(now.clone()),
            resolution: grid.resolution,
            width: grid.width,
            height: grid.height,
            origin: Some(Pose::planar(grid.origin.x, grid.origin.y, 0.0)),
        };
        let message = OccupancyGrid {
            header: Some(Header { seq: 0, stamp: Some(now), frame_id: MAP_FRAME.to_string() }),
            info: Some(metadata.clone()),
            data: grid.cells,
        };

        if let Err(e) = self.transport.publish_map_metadata(&metadata) {
            warn!(error = %e, "map metadata publish failed");
        }
        if let Err(e) = self.transport.publish_map(&message) {
            warn!(error = %e, "map publish failed");
        }
        info!(width = grid.width, height = grid.height, resolution = grid.resolution, "map published");
    }

    /// Convert a pixel-space marker pose and send it as an initial pose.
    fn send_initial_pose(&self, pose: PixelPose) {
        let metric = self.engine.converter.pixel_to_metric(pose.center);
        info!(x = metric.x, y = metric.y, yaw = pose.heading, "initial pose");
        self.publish_pose(&Pose::planar(metric.x, metric.y, pose.heading));
    }

    fn publish_pose(&self, pose: &Pose) {
        if let Err(e) = self.transport.publish_initial_pose(pose) {
            warn!(error = %e, "initial pose publish failed");
        }
    }

    /// Carry out transport-bound actions and return the rest.
    fn dispatch(&mut self, actions: Vec<Action>) -> Vec<Action> {
        let mut remaining = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                Action::MapChanged => self.update_map(),
                Action::PublishPose(pose) => self.send_initial_pose(pose),
                Action::SetCursor(_) | Action::RenderNeeded => remaining.push(action),
            }
        }
        remaining
    }

    // --- Queries ---

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn status(&self) -> StatusReport {
        let (width, height) = self.engine.doc.background().dimensions();
        let robot = self.engine.current_pose().map(|pose| {
            let metric = self.engine.converter.pixel_to_metric(pose.center);
            MetricPose { x: metric.x, y: metric.y, yaw: pose.heading }
        });
        StatusReport {
            mode: self.engine.mode,
            map: self.map_source.clone(),
            width,
            height,
            resolution: self.engine.converter.resolution(),
            walls: self.engine.doc.wall_count(),
            next_wall: self.engine.wall_counter(),
            robot,
            shut_down: self.shut_down,
        }
    }
}
