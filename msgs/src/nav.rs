//! Navigation messages: map metadata and occupancy grids.

use prost::Message;
use prost_types::Timestamp;

use crate::geometry::Pose;

/// Standard metadata for stamped messages.
#[derive(Clone, PartialEq, Message)]
pub struct Header {
    /// Sequence number; always 0 for messages produced here.
    #[prost(uint32, tag = "1")]
    pub seq: u32,
    /// Time the message was produced.
    #[prost(message, optional, tag = "2")]
    pub stamp: Option<Timestamp>,
    /// Coordinate frame the data is expressed in.
    #[prost(string, tag = "3")]
    pub frame_id: String,
}

/// Metadata about the map.
#[derive(Clone, PartialEq, Message)]
pub struct MapMetaData {
    /// The time at which the map was loaded.
    #[prost(message, optional, tag = "1")]
    pub map_load_time: Option<Timestamp>,
    /// The map resolution (meters/cell).
    #[prost(double, tag = "2")]
    pub resolution: f64,
    /// Map width (cells).
    #[prost(uint32, tag = "3")]
    pub width: u32,
    /// Map height (cells).
    #[prost(uint32, tag = "4")]
    pub height: u32,
    /// The real-world pose of cell (0, 0).
    #[prost(message, optional, tag = "5")]
    pub origin: Option<Pose>,
}

/// A 2-D grid map in which each cell holds the probability of occupancy.
#[derive(Clone, PartialEq, Message)]
pub struct OccupancyGrid {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    /// Metadata for the map.
    #[prost(message, optional, tag = "2")]
    pub info: Option<MapMetaData>,
    /// Row-major cell values in `[0, 100]`, starting with (0, 0).
    #[prost(bytes = "vec", tag = "3")]
    pub data: Vec<u8>,
}
