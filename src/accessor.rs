/* src/accessor.rs */

use tracing::debug;

use crate::context::RequestContext;
use crate::error::Result;
use crate::location::Location;
use crate::state::{State, StateStore};

/// Key under which the location is kept in a [`StateStore`].
pub const LOCATION_KEY: &str = "location";

/// Where the accessor is being called from.
#[derive(Debug, Clone, Copy)]
pub enum RenderMode<'a> {
    /// Rendering a response; the request's context is available.
    Server(&'a RequestContext),
    /// Running after hydration; only the payload is available.
    Client,
}

/// The location to start from before any keyed state exists.
///
/// On the server this is the request's resolved location when there is one.
/// A bare forwarded-IP marker does not count as a location.
pub fn default_location(mode: RenderMode<'_>, fallback: Location) -> Location {
    match mode {
        RenderMode::Server(context) => match context.resolved_location() {
            Some(location) => location.clone(),
            None => {
                debug!("No resolved location on request, using fallback");
                fallback
            }
        },
        RenderMode::Client => fallback,
    }
}

/// The keyed location value, initialized on first use.
///
/// Later calls on the same store return the same value without recomputing
/// it. On the client, a store hydrated from the server payload yields the
/// server's value.
pub fn use_location(store: &mut StateStore, mode: RenderMode<'_>) -> Result<State<Location>> {
    use_location_or(store, mode, Location::fallback())
}

/// Like [`use_location`] with a custom fallback.
pub fn use_location_or(
    store: &mut StateStore,
    mode: RenderMode<'_>,
    fallback: Location,
) -> Result<State<Location>> {
    store.use_state(LOCATION_KEY, || default_location(mode, fallback))
}
