//! Machine-readable API manifest.

use serde::Serialize;

/// One documented route.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
    pub requires_api_key: bool,
}

/// The service manifest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: &'static str,
    pub version: &'static str,
    pub auth: AuthInfo,
    pub endpoints: &'static [Endpoint],
}

/// How callers authenticate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    pub enabled: bool,
    pub header: &'static str,
    pub query_param: &'static str,
}

pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        method: "GET",
        path: "/health",
        description: "Liveness probe",
        requires_api_key: false,
    },
    Endpoint {
        method: "GET",
        path: "/api/manifest",
        description: "This document",
        requires_api_key: false,
    },
    Endpoint {
        method: "POST",
        path: "/api/proximity/distance",
        description: "Haversine distance, classification and display string between two points",
        requires_api_key: true,
    },
    Endpoint {
        method: "POST",
        path: "/api/proximity/nearby",
        description: "Candidates within a radius of an origin, nearest first",
        requires_api_key: true,
    },
    Endpoint {
        method: "POST",
        path: "/api/proximity/broadcast",
        description: "Publish a position to every open stream on a channel",
        requires_api_key: true,
    },
    Endpoint {
        method: "GET",
        path: "/api/proximity/stream/:channelId",
        description: "Server-sent event stream of positions published to a channel",
        requires_api_key: true,
    },
    Endpoint {
        method: "GET",
        path: "/api/proximity/channels",
        description: "Live channels and their subscriber counts",
        requires_api_key: true,
    },
    Endpoint {
        method: "POST",
        path: "/api/consent",
        description: "Grant consent from one profile to another",
        requires_api_key: true,
    },
    Endpoint {
        method: "GET",
        path: "/api/consent/:consentId",
        description: "Check whether a consent is in force",
        requires_api_key: true,
    },
    Endpoint {
        method: "DELETE",
        path: "/api/consent/:consentId",
        description: "Revoke a consent",
        requires_api_key: true,
    },
];

/// Build the manifest for the running server.
#[must_use]
pub fn manifest(auth_enabled: bool) -> Manifest {
    Manifest {
        name: "proxima",
        version: env!("CARGO_PKG_VERSION"),
        auth: AuthInfo {
            enabled: auth_enabled,
            header: crate::auth::API_KEY_HEADER,
            query_param: crate::auth::API_KEY_PARAM,
        },
        endpoints: ENDPOINTS,
    }
}
