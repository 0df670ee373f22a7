use image::GrayImage;
use tracing::debug;

use crate::convert::{CoordinateConverter, Point};
use crate::doc::{CanvasModel, RobotMarker, heading_between, wall_id};
use crate::hit::{Hit, hit_test};
use crate::input::{Gesture, Key, KeyCommand, Mode, key_command};
use crate::raster::{self, OccupancyGrid};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// A robot pose in pixel space, as read off the marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPose {
    pub center: Point,
    pub heading: f64,
}

impl From<&RobotMarker> for PixelPose {
    fn from(marker: &RobotMarker) -> Self {
        Self { center: marker.center, heading: marker.heading() }
    }
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Show a different pointer cursor.
    SetCursor(&'static str),
    /// Canvas entities changed; redraw.
    RenderNeeded,
    /// Send this pose as the robot's initial pose. Still in pixel space.
    PublishPose(PixelPose),
    /// Wall geometry may have changed; re-rasterize and republish the map.
    MapChanged,
}

/// Editing engine: the canvas model plus the mode/gesture state machine.
///
/// Holds no I/O. Every handler returns the actions the host must carry out.
pub struct Engine {
    pub doc: CanvasModel,
    pub converter: CoordinateConverter,
    pub mode: Mode,
    pub gesture: Gesture,
    robot_radius_px: f64,
    wall_counter: u64,
}

impl Engine {
    #[must_use]
    pub fn new(background: GrayImage, converter: CoordinateConverter, robot_radius_px: f64) -> Self {
        Self {
            doc: CanvasModel::new(background),
            converter,
            mode: Mode::Idle,
            gesture: Gesture::None,
            robot_radius_px,
            wall_counter: 0,
        }
    }

    // --- Data inputs ---

    /// Replace the map: new background, converter and marker size.
    ///
    /// The marker and all walls are discarded and wall numbering restarts at
    /// zero. The active mode is kept; any gesture is dropped.
    pub fn load_map(
        &mut self,
        background: GrayImage,
        converter: CoordinateConverter,
        robot_radius_px: f64,
    ) -> Vec<Action> {
        self.doc.replace_background(background);
        self.converter = converter;
        self.robot_radius_px = robot_radius_px;
        self.wall_counter = 0;
        self.gesture = Gesture::None;
        vec![Action::RenderNeeded, Action::MapChanged]
    }

    /// Apply a live metric pose from the robot.
    ///
    /// Suppressed while the operator is in `SetRobotPose`, so the incoming
    /// stream does not fight an in-progress edit.
    pub fn apply_live_pose(&mut self, x: f64, y: f64, yaw: f64) -> Vec<Action> {
        if self.mode == Mode::SetRobotPose {
            debug!("live pose ignored while setting robot pose");
            return Vec::new();
        }
        let center = self.converter.metric_to_pixel(Point::new(x, y));
        self.doc.place_robot(center, yaw, self.robot_radius_px);
        vec![Action::RenderNeeded]
    }

    // --- Keyboard ---

    /// Handle a key press.
    pub fn on_key(&mut self, key: &Key) -> Vec<Action> {
        match key_command(key) {
            Some(KeyCommand::Toggle(Mode::SetRobotPose)) if self.mode == Mode::SetRobotPose => {
                let mut actions = self.confirm_pose();
                actions.extend(self.set_mode(Mode::Idle));
                actions
            }
            Some(KeyCommand::Toggle(mode)) if self.mode == mode => self.set_mode(Mode::Idle),
            Some(KeyCommand::Toggle(mode)) => self.set_mode(mode),
            Some(KeyCommand::ConfirmPose) if self.mode == Mode::SetRobotPose => self.confirm_pose(),
            Some(KeyCommand::ConfirmPose) | None => Vec::new(),
        }
    }

    /// Switch modes, abandoning any gesture in progress.
    ///
    /// Whatever the gesture already changed stays as it is. Leaving a wall
    /// editing mode asks for a re-rasterization.
    pub fn set_mode(&mut self, mode: Mode) -> Vec<Action> {
        if mode == self.mode {
            return Vec::new();
        }
        let previous = self.mode;
        debug!(from = ?previous, to = ?mode, "mode change");
        self.mode = mode;
        self.finish_wall_gesture();
        self.gesture = Gesture::None;

        let mut actions = Vec::new();
        if previous.edits_walls() {
            actions.push(Action::MapChanged);
        }
        actions.push(Action::SetCursor(mode.cursor()));
        actions
    }

    /// Emit the marker's current pose, if there is a marker.
    fn confirm_pose(&self) -> Vec<Action> {
        self.current_pose().map(Action::PublishPose).into_iter().collect()
    }

    // --- Pointer ---

    pub fn on_pointer_down(&mut self, pt: Point) -> Vec<Action> {
        match self.mode {
            Mode::Idle => Vec::new(),
            Mode::SetRobotPose => self.robot_down(pt),
            Mode::AddWall => self.wall_down(pt),
            Mode::DeleteWall => self.delete_down(pt),
        }
    }

    pub fn on_pointer_drag(&mut self, pt: Point) -> Vec<Action> {
        match self.mode {
            Mode::Idle | Mode::DeleteWall => Vec::new(),
            Mode::SetRobotPose => self.robot_drag(pt),
            Mode::AddWall => self.wall_drag(pt),
        }
    }

    /// Finish the gesture and drop back to `Idle`.
    ///
    /// Each press/release pair is one edit. Leaving a wall mode this way
    /// republishes the map like any other mode exit.
    pub fn on_pointer_up(&mut self, _pt: Point) -> Vec<Action> {
        let mut actions = match self.mode {
            Mode::Idle => return Vec::new(),
            Mode::SetRobotPose => self.robot_up(),
            Mode::AddWall | Mode::DeleteWall => Vec::new(),
        };
        actions.extend(self.set_mode(Mode::Idle));
        actions
    }

    // --- SetRobotPose ---

    fn robot_down(&mut self, pt: Point) -> Vec<Action> {
        if self.doc.robot().is_none() {
            debug!("no robot marker to edit");
            return Vec::new();
        }
        if hit_test(pt, &self.doc) == Some(Hit::Robot) {
            self.gesture = Gesture::TranslatingRobot { last: pt };
            return Vec::new();
        }
        // Off-marker presses rotate about the marker's current center,
        // wherever they land.
        self.gesture = Gesture::RotatingRobot;
        self.rotate_robot_towards(pt)
    }

    fn robot_drag(&mut self, pt: Point) -> Vec<Action> {
        match self.gesture {
            Gesture::TranslatingRobot { last } => {
                if let Some(marker) = self.doc.robot_mut() {
                    marker.translate(pt.x - last.x, pt.y - last.y);
                }
                self.gesture = Gesture::TranslatingRobot { last: pt };
                vec![Action::RenderNeeded]
            }
            Gesture::RotatingRobot => self.rotate_robot_towards(pt),
            Gesture::None | Gesture::DrawingWall { .. } => Vec::new(),
        }
    }

    fn robot_up(&mut self) -> Vec<Action> {
        if self.gesture == Gesture::None {
            return Vec::new();
        }
        self.gesture = Gesture::None;
        self.confirm_pose()
    }

    fn rotate_robot_towards(&mut self, pt: Point) -> Vec<Action> {
        let Some(marker) = self.doc.robot_mut() else {
            return Vec::new();
        };
        let yaw = heading_between(marker.center, pt);
        marker.point_towards(yaw);
        vec![Action::RenderNeeded]
    }

    // --- AddWall ---

    fn wall_down(&mut self, pt: Point) -> Vec<Action> {
        self.finish_wall_gesture();
        let id = wall_id(self.wall_counter);
        debug!(%id, x = pt.x, y = pt.y, "wall started");
        self.doc.add_wall(id.clone(), pt);
        self.gesture = Gesture::DrawingWall { id };
        vec![Action::RenderNeeded]
    }

    fn wall_drag(&mut self, pt: Point) -> Vec<Action> {
        let Gesture::DrawingWall { id } = &self.gesture else {
            return Vec::new();
        };
        let Some(wall) = self.doc.wall_mut(id) else {
            return Vec::new();
        };
        wall.end = pt;
        vec![Action::RenderNeeded]
    }

    /// Close an open wall gesture so its id is never handed out again.
    /// The wall keeps whatever length it reached.
    fn finish_wall_gesture(&mut self) {
        if let Gesture::DrawingWall { id } = std::mem::take(&mut self.gesture) {
            debug!(%id, "wall finished");
            self.wall_counter += 1;
        }
    }

    // --- DeleteWall ---

    fn delete_down(&mut self, pt: Point) -> Vec<Action> {
        let Some(Hit::Wall(id)) = hit_test(pt, &self.doc) else {
            return Vec::new();
        };
        self.doc.remove_wall(&id);
        debug!(%id, "wall deleted");
        vec![Action::RenderNeeded]
    }

    // --- Queries ---

    /// The marker's pose in pixel space, if a marker exists.
    #[must_use]
    pub fn current_pose(&self) -> Option<PixelPose> {
        self.doc.robot().map(PixelPose::from)
    }

    /// Identifier counter for the next wall.
    #[must_use]
    pub fn wall_counter(&self) -> u64 {
        self.wall_counter
    }

    /// Marker radius in pixels for the current map.
    #[must_use]
    pub fn robot_radius_px(&self) -> f64 {
        self.robot_radius_px
    }

    /// Rasterize the current walls onto the background.
    #[must_use]
    pub fn rasterize(&self) -> OccupancyGrid {
        raster::rasterize(self.doc.background(), self.doc.walls_in_draw_order(), self.converter.resolution())
    }
}
