//! Outbound messaging seam between the controller and the bus.
//!
//! The controller only knows [`Transport`]. [`BusTransport`] encodes each
//! message into a `msgs` envelope and publishes it on the configured topic.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::time::{SystemTime, UNIX_EPOCH};

use msgs::{MapMetaData, OccupancyGrid, Pose, TopicMessage};
use tracing::debug;

use crate::bus::Bus;
use crate::config::Topics;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("subscriber queue full on topic {topic}")]
    QueueFull { topic: String },
    #[error("transport closed; cannot publish on topic {topic}")]
    Closed { topic: String },
}

/// Publishers the controller sends through.
///
/// Every call is fire-and-forget; callers log failures and carry on.
pub trait Transport {
    /// Publish an initial-pose request (not latched).
    fn publish_initial_pose(&self, pose: &Pose) -> Result<(), TransportError>;

    /// Publish map metadata (latched).
    fn publish_map_metadata(&self, metadata: &MapMetaData) -> Result<(), TransportError>;

    /// Publish an occupancy grid (latched).
    fn publish_map(&self, grid: &OccupancyGrid) -> Result<(), TransportError>;

    /// Release the transport. Later publishes fail with [`TransportError::Closed`].
    fn close(&self);
}

/// [`Transport`] backed by the in-process [`Bus`].
#[derive(Clone)]
pub struct BusTransport {
    bus: Bus,
    topics: Topics,
}

impl BusTransport {
    /// Wrap `bus`, declaring the map and metadata topics latched.
    #[must_use]
    pub fn new(bus: Bus, topics: Topics) -> Self {
        bus.declare_latched(&topics.map);
        bus.declare_latched(&topics.map_metadata);
        Self { bus, topics }
    }

    /// Publish a pose on the live pose topic, as the robot would.
    pub fn publish_live_pose(&self, pose: &Pose) -> Result<(), TransportError> {
        self.send(&self.topics.pose, pose)
    }

    fn send<M: TopicMessage>(&self, topic: &str, message: &M) -> Result<(), TransportError> {
        let bytes = msgs::encode_envelope(topic, now_ms(), message);
        let delivered = self.bus.publish(topic, bytes)?;
        debug!(topic, delivered, kind = ?M::KIND, "published");
        Ok(())
    }
}

impl Transport for BusTransport {
    fn publish_initial_pose(&self, pose: &Pose) -> Result<(), TransportError> {
        self.send(&self.topics.initial_pose, pose)
    }

    fn publish_map_metadata(&self, metadata: &MapMetaData) -> Result<(), TransportError> {
        self.send(&self.topics.map_metadata, metadata)
    }

    fn publish_map(&self, grid: &OccupancyGrid) -> Result<(), TransportError> {
        self.send(&self.topics.map, grid)
    }

    fn close(&self) {
        self.bus.close();
    }
}

/// Milliseconds since the Unix epoch, saturating on clock errors.
#[must_use]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}
