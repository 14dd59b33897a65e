//! # proxima-protocol
//!
//! Wire format for Proxima position streams.
//!
//! Subscribers receive a `text/event-stream` body. Every frame is a named
//! event followed by a single JSON data line:
//!
//! ```text
//! event: connected
//! data: {"channelId":"c1","subscriberCount":1,"timestamp":"..."}
//!
//! event: position
//! data: {"profileId":"p1","location":{"lat":52.52,"lng":13.405},"timestamp":"..."}
//!
//! ```
//!
//! ## Frame Types
//!
//! - `Connected` - Welcome frame sent once on attach
//! - `Position` - A published broadcast event
//! - `KeepAlive` - Comment line emitted on idle streams
//!
//! ## Example
//!
//! ```rust
//! use proxima_geo::GeoPoint;
//! use proxima_protocol::{codec, BroadcastEvent, Frame};
//!
//! let event = BroadcastEvent::new("p1", GeoPoint::new(52.52, 13.405), None);
//! let encoded = codec::encode(&Frame::Position(event)).unwrap();
//! let decoded = codec::decode(&encoded).unwrap();
//! assert_eq!(decoded.event_name(), Some("position"));
//! ```

pub mod codec;
pub mod frames;

pub use codec::{decode, encode, ProtocolError};
pub use frames::{BroadcastEvent, Frame, Welcome};
