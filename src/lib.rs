/* src/lib.rs */
//! # ip2loc
//!
//! Resolve a visitor's location from their IP address and hand it to
//! rendering code, with a hardcoded fallback when nothing can be determined.
//!
//! ## Features
//!
//! - Loose IPv4 detection from the socket address, with a forwarding-header fallback
//! - Best-effort lookup against ip-api.com; failures are logged, never returned
//! - Per-request [`RequestContext`] holding the result
//! - Keyed location accessor that survives the server to client hand-off
//! - Optional Axum middleware and extractor integration via the `axum` feature
//!
//! ## Examples
//!
//! ### Extracting the IP
//!
//! ```rust
//! use ip2loc::{IpExtractor, RequestContext, headers_from_pairs};
//!
//! let headers = headers_from_pairs([("x-forwarded-for", "203.0.113.7")]);
//! let mut context = RequestContext::new();
//!
//! // A usable socket address is returned directly.
//! let ip = IpExtractor::new().extract(Some("192.0.2.1"), &headers, &mut context);
//! assert_eq!(ip.as_deref(), Some("192.0.2.1"));
//!
//! // Otherwise a forwarding header is recorded on the context instead.
//! let ip = IpExtractor::new().extract(Some("::1"), &headers, &mut context);
//! assert_eq!(ip, None);
//! assert_eq!(context.forwarded_ip(), Some("203.0.113.7"));
//! ```
//!
//! ### Reading the location
//!
//! ```rust
//! use ip2loc::{Location, RenderMode, RequestContext, StateStore, use_location};
//!
//! let context = RequestContext::new();
//! let mut store = StateStore::new();
//! let location = use_location(&mut store, RenderMode::Server(&context)).unwrap();
//! assert_eq!(location.get(), Location::fallback());
//! ```

pub mod accessor;
pub mod context;
pub mod error;
pub mod extractor;
pub mod location;
pub mod provider;
pub mod resolver;
pub mod state;

#[cfg(feature = "axum")]
pub mod middleware;

pub use accessor::{LOCATION_KEY, RenderMode, default_location, use_location, use_location_or};
pub use context::{ContextLocation, RequestContext};
pub use error::{GeoError, Result};
pub use extractor::{HeaderValue, Headers, IpExtractor, headers_from_pairs, is_dotted_quad};
pub use location::Location;
pub use provider::{DEFAULT_SERVICE_URL, GeoLookup, IpApiProvider, IpLookupResponse};
pub use resolver::GeoResolver;
pub use state::{State, StateStore};

#[cfg(feature = "axum")]
pub use middleware::{GeoLocationLayer, GeoLocationService};
