//! Nearby candidate filtering.

use crate::distance::haversine_km;
use crate::point::{GeoError, GeoPoint};
use serde::{Deserialize, Serialize};

/// A profile position to test against an origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Profile identifier.
    pub profile_id: String,
    /// Last known position.
    pub location: GeoPoint,
}

/// A candidate that falls inside the search radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyMatch {
    /// Profile identifier.
    pub profile_id: String,
    /// Position of the profile.
    pub location: GeoPoint,
    /// Distance from the origin in kilometres.
    pub distance_km: f64,
}

/// Keep candidates within `radius_km` of `origin`, nearest first.
///
/// The radius is inclusive. Candidates with invalid coordinates are skipped.
/// When `limit` is set the result is truncated after sorting.
///
/// # Errors
///
/// Returns an error if the origin is invalid or the radius is negative or
/// not finite.
pub fn find_nearby<I>(
    origin: GeoPoint,
    candidates: I,
    radius_km: f64,
    limit: Option<usize>,
) -> Result<Vec<NearbyMatch>, GeoError>
where
    I: IntoIterator<Item = Candidate>,
{
    origin.validate()?;
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(GeoError::InvalidRadius(radius_km));
    }

    let mut matches: Vec<NearbyMatch> = candidates
        .into_iter()
        .filter(|c| c.location.validate().is_ok())
        .filter_map(|c| {
            let distance_km = haversine_km(origin, c.location);
            (distance_km <= radius_km).then(|| NearbyMatch {
                profile_id: c.profile_id,
                location: c.location,
                distance_km,
            })
        })
        .collect();

    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    if let Some(limit) = limit {
        matches.truncate(limit);
    }

    Ok(matches)
}
