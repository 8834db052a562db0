/* src/context.rs */

use serde::{Deserialize, Serialize};

use crate::location::Location;

/// What a request has learned about its caller's location.
///
/// Serializes untagged, so a resolved location is written as
/// `{"latitude", "longitude", "city"}` and the marker as `{"ip"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextLocation {
    /// Location returned by the geolocation service.
    Resolved(Location),
    /// IP taken from a forwarding header. It is recorded but never looked up.
    Ip { ip: String },
}

/// Per-request bag the resolver writes into.
///
/// Created fresh for every request and dropped with it. In the Axum middleware
/// it ends up as a request extension once resolution has finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ContextLocation>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved location, ignoring a bare IP marker.
    pub fn resolved_location(&self) -> Option<&Location> {
        match &self.location {
            Some(ContextLocation::Resolved(location)) => Some(location),
            _ => None,
        }
    }

    /// The IP recorded from a forwarding header, if any.
    pub fn forwarded_ip(&self) -> Option<&str> {
        match &self.location {
            Some(ContextLocation::Ip { ip }) => Some(ip),
            _ => None,
        }
    }
}
