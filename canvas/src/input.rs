//! Input model: editing modes, key bindings, and the gesture state machine.
//!
//! `Mode` captures which editing tool the operator has toggled on. `Gesture`
//! is the pointer interaction tracked between pointer-down and pointer-up,
//! carrying the context needed to apply incremental drags. Switching modes
//! abandons the gesture without rolling back what it already changed.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::Serialize;

use crate::convert::Point;
use crate::doc::WallId;

/// Which editing mode is active. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Pointer events are ignored (default).
    #[default]
    Idle,
    /// Drag the robot marker or rotate its heading.
    SetRobotPose,
    /// Draw new wall segments.
    AddWall,
    /// Click a wall to remove it.
    DeleteWall,
}

impl Mode {
    /// Cursor name the host shows while this mode is active.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Idle => "left_ptr",
            Self::SetRobotPose => "hand1",
            Self::AddWall => "pencil",
            Self::DeleteWall => "X_cursor",
        }
    }

    /// Whether leaving this mode should re-rasterize the map.
    #[must_use]
    pub fn edits_walls(self) -> bool {
        matches!(self, Self::AddWall | Self::DeleteWall)
    }
}

/// A keyboard key, named as the host toolkit reports it (e.g. `"w"`, `"Return"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// What a key press asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Toggle the given mode on, or back to idle if it is already active.
    Toggle(Mode),
    /// Emit the current robot marker pose without leaving the mode.
    ConfirmPose,
}

/// Map a key to its command. Unbound keys return `None`.
#[must_use]
pub fn key_command(key: &Key) -> Option<KeyCommand> {
    match key.0.as_str() {
        "w" => Some(KeyCommand::Toggle(Mode::AddWall)),
        "d" => Some(KeyCommand::Toggle(Mode::DeleteWall)),
        "p" => Some(KeyCommand::Toggle(Mode::SetRobotPose)),
        "Return" => Some(KeyCommand::ConfirmPose),
        _ => None,
    }
}

/// Pointer gesture in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    /// No gesture; waiting for the next pointer-down.
    #[default]
    None,
    /// Dragging the robot marker. Started by pressing on the marker.
    TranslatingRobot {
        /// Pointer position at the previous event; the pickup offset is kept
        /// by moving the marker by pointer deltas only.
        last: Point,
    },
    /// Turning the robot heading about its fixed center. Started by pressing
    /// anywhere off the marker.
    RotatingRobot,
    /// Stretching a freshly created wall.
    DrawingWall {
        /// Id of the wall whose free endpoint follows the pointer.
        id: WallId,
    },
}
