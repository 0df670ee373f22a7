//! Typed pub/sub messages and the protobuf envelope codec.
//!
//! This crate owns the wire representation shared by every publisher and
//! subscriber of the world-state tool. Messages mirror the robot middleware's
//! geometry and navigation types; each one travels inside an [`Envelope`]
//! that names its topic and kind so a subscriber can reject payloads it does
//! not understand before decoding them.

pub mod geometry;
pub mod nav;

use prost::Message;

pub use geometry::{Point, Pose, Quaternion};
pub use nav::{Header, MapMetaData, OccupancyGrid};
pub use prost_types::Timestamp;

/// Error returned by [`decode_envelope`] and [`Envelope::into_message`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw bytes could not be decoded as a protobuf message.
    #[error("failed to decode protobuf message: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The `kind` integer on the wire does not map to a known [`MessageKind`].
    #[error("invalid message kind: {0}")]
    InvalidKind(i32),
    /// The envelope carries a different message type than the caller asked for.
    #[error("expected {expected:?} payload, found {found:?}")]
    UnexpectedKind { expected: MessageKind, found: MessageKind },
}

/// The message type carried by an envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// A [`Pose`] (live robot pose or initial-pose request).
    Pose,
    /// A [`MapMetaData`] describing the published grid.
    MapMetaData,
    /// A full [`OccupancyGrid`].
    OccupancyGrid,
}

impl MessageKind {
    /// Convert kind into wire enum integer value.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Pose => WireKind::Pose as i32,
            Self::MapMetaData => WireKind::MapMetaData as i32,
            Self::OccupancyGrid => WireKind::OccupancyGrid as i32,
        }
    }

    /// Parse a kind from wire enum integer value.
    fn from_i32(value: i32) -> Result<Self, CodecError> {
        match WireKind::try_from(value) {
            Ok(WireKind::Pose) => Ok(Self::Pose),
            Ok(WireKind::MapMetaData) => Ok(Self::MapMetaData),
            Ok(WireKind::OccupancyGrid) => Ok(Self::OccupancyGrid),
            Err(_) => Err(CodecError::InvalidKind(value)),
        }
    }
}

/// A message type that can travel on a topic.
pub trait TopicMessage: Message + Default + Sized {
    /// Kind tag written into the envelope.
    const KIND: MessageKind;
}

impl TopicMessage for Pose {
    const KIND: MessageKind = MessageKind::Pose;
}

impl TopicMessage for MapMetaData {
    const KIND: MessageKind = MessageKind::MapMetaData;
}

impl TopicMessage for OccupancyGrid {
    const KIND: MessageKind = MessageKind::OccupancyGrid;
}

/// A decoded envelope whose payload has not been interpreted yet.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    /// Topic the message was published on.
    pub topic: String,
    /// Milliseconds since the Unix epoch when the message was published.
    pub ts: i64,
    /// Type of the payload.
    pub kind: MessageKind,
    /// Protobuf-encoded message body.
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Decode the payload as `M`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedKind`] when the envelope holds a
    /// different message type, or [`CodecError::Decode`] for a corrupt body.
    pub fn into_message<M: TopicMessage>(self) -> Result<M, CodecError> {
        if self.kind != M::KIND {
            return Err(CodecError::UnexpectedKind { expected: M::KIND, found: self.kind });
        }
        Ok(M::decode(self.payload.as_slice())?)
    }
}

/// Encode a message for `topic` into envelope bytes.
#[must_use]
pub fn encode_envelope<M: TopicMessage>(topic: &str, ts: i64, message: &M) -> Vec<u8> {
    let wire = WireEnvelope {
        topic: topic.to_owned(),
        ts,
        kind: M::KIND.as_i32(),
        payload: message.encode_to_vec(),
    };
    wire.encode_to_vec()
}

/// Decode envelope bytes without interpreting the payload.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes and
/// [`CodecError::InvalidKind`] for out-of-range kind values.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, CodecError> {
    let wire = WireEnvelope::decode(bytes)?;
    Ok(Envelope {
        topic: wire.topic,
        ts: wire.ts,
        kind: MessageKind::from_i32(wire.kind)?,
        payload: wire.payload,
    })
}

/// Decode envelope bytes straight into `M`.
///
/// # Errors
///
/// Any error from [`decode_envelope`] or [`Envelope::into_message`].
pub fn decode_message<M: TopicMessage>(bytes: &[u8]) -> Result<M, CodecError> {
    decode_envelope(bytes)?.into_message()
}

#[derive(Clone, PartialEq, Message)]
struct WireEnvelope {
    #[prost(string, tag = "1")]
    topic: String,
    #[prost(int64, tag = "2")]
    ts: i64,
    #[prost(enumeration = "WireKind", tag = "3")]
    kind: i32,
    #[prost(bytes = "vec", tag = "4")]
    payload: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WireKind {
    Pose = 0,
    MapMetaData = 1,
    OccupancyGrid = 2,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
