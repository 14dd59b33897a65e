//! # proxima-geo
//!
//! Geodesic helpers used by the Proxima proximity service.
//!
//! - **Point** - WGS84 latitude/longitude pair with validation
//! - **Distance** - Great-circle (haversine) distance
//! - **Classify** - Coarse distance bands
//! - **Format** - Human-readable distance strings
//! - **Nearby** - Radius filter and nearest-first ordering
//!
//! ## Example
//!
//! ```rust
//! use proxima_geo::{classify, format_distance, haversine_km, DistanceClass, GeoPoint};
//!
//! let berlin = GeoPoint::new(52.52, 13.405);
//! let potsdam = GeoPoint::new(52.3906, 13.0645);
//!
//! let km = haversine_km(berlin, potsdam);
//! assert_eq!(classify(km), DistanceClass::Far);
//! assert!(format_distance(km).ends_with("km"));
//! ```

pub mod classify;
pub mod distance;
pub mod format;
pub mod nearby;
pub mod point;

pub use classify::{classify, DistanceClass};
pub use distance::{haversine_km, haversine_meters, EARTH_RADIUS_KM};
pub use format::format_distance;
pub use nearby::{find_nearby, Candidate, NearbyMatch};
pub use point::{GeoError, GeoPoint};
