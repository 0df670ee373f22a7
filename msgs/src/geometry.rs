//! Geometry messages: points, orientations and poses in metric space.

use prost::Message;

/// A position in metric space.
#[derive(Clone, Copy, PartialEq, Message)]
pub struct Point {
    #[prost(double, tag = "1")]
    pub x: f64,
    #[prost(double, tag = "2")]
    pub y: f64,
    #[prost(double, tag = "3")]
    pub z: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// An orientation as a unit quaternion.
#[derive(Clone, Copy, PartialEq, Message)]
pub struct Quaternion {
    #[prost(double, tag = "1")]
    pub x: f64,
    #[prost(double, tag = "2")]
    pub y: f64,
    #[prost(double, tag = "3")]
    pub z: f64,
    #[prost(double, tag = "4")]
    pub w: f64,
}

impl Quaternion {
    /// Pure rotation of `yaw` radians about the z axis.
    #[must_use]
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw / 2.0;
        Self { x: 0.0, y: 0.0, z: half.sin(), w: half.cos() }
    }

    /// Rotation about the z axis, in radians within `[-pi, pi]`.
    #[must_use]
    pub fn yaw(&self) -> f64 {
        let siny_cosp = 2.0 * (self.w * self.z + self.x * self.y);
        let cosy_cosp = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        siny_cosp.atan2(cosy_cosp)
    }
}

/// Position plus orientation.
#[derive(Clone, Copy, PartialEq, Message)]
pub struct Pose {
    #[prost(message, optional, tag = "1")]
    pub position: Option<Point>,
    #[prost(message, optional, tag = "2")]
    pub orientation: Option<Quaternion>,
}

impl Pose {
    /// A pose on the ground plane (`z = 0`) facing `yaw`.
    #[must_use]
    pub fn planar(x: f64, y: f64, yaw: f64) -> Self {
        Self {
            position: Some(Point::new(x, y, 0.0)),
            orientation: Some(Quaternion::from_yaw(yaw)),
        }
    }

    /// Position x, or `0.0` when the position is absent.
    #[must_use]
    pub fn x(&self) -> f64 {
        self.position.map_or(0.0, |p| p.x)
    }

    /// Position y, or `0.0` when the position is absent.
    #[must_use]
    pub fn y(&self) -> f64 {
        self.position.map_or(0.0, |p| p.y)
    }

    /// Heading in radians, or `0.0` when the orientation is absent.
    #[must_use]
    pub fn yaw(&self) -> f64 {
        self.orientation.map_or(0.0, |q| q.yaw())
    }
}
