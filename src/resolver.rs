/* src/resolver.rs */

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::context::{ContextLocation, RequestContext};
use crate::error::Result;
use crate::extractor::{Headers, IpExtractor};
use crate::location::Location;
use crate::provider::{GeoLookup, IpApiProvider};

/// Resolves a request's location: extract the IP, look it up, record it.
#[derive(Clone)]
pub struct GeoResolver {
    extractor: IpExtractor,
    lookup: Arc<dyn GeoLookup>,
}

impl Default for GeoResolver {
    fn default() -> Self {
        Self::new(IpApiProvider::default())
    }
}

impl std::fmt::Debug for GeoResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoResolver")
            .field("extractor", &self.extractor)
            .field("lookup", &self.lookup.name())
            .finish()
    }
}

impl GeoResolver {
    /// Create a resolver backed by `lookup` with the default extractor.
    pub fn new(lookup: impl GeoLookup + 'static) -> Self {
        Self::from_arc(Arc::new(lookup))
    }

    /// Create a resolver sharing an existing provider.
    pub fn from_arc(lookup: Arc<dyn GeoLookup>) -> Self {
        Self {
            extractor: IpExtractor::default(),
            lookup,
        }
    }

    /// Replace the IP extractor configuration.
    pub fn with_extractor(mut self, extractor: IpExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn extractor(&self) -> &IpExtractor {
        &self.extractor
    }

    /// Look up `ip` without touching any request context.
    pub async fn lookup_ip(&self, ip: &str) -> Result<Location> {
        self.lookup.lookup(ip).await
    }

    /// Best-effort resolution for one request.
    ///
    /// On success the location is written to `context` and returned. Every
    /// failure is logged and yields `None`; the context is then left as the
    /// extractor left it.
    pub async fn resolve(
        &self,
        remote_addr: Option<&str>,
        headers: &Headers,
        context: &mut RequestContext,
    ) -> Option<Location> {
        let Some(ip) = self.extractor.extract(remote_addr, headers, context) else {
            match context.forwarded_ip() {
                // Header IPs are recorded as is and not looked up.
                Some(forwarded) => debug!(ip = %forwarded, "Recorded forwarded IP"),
                None => info!("No IP found"),
            }
            return None;
        };

        match self.lookup_ip(&ip).await {
            Ok(location) => {
                debug!(
                    %ip,
                    provider = self.lookup.name(),
                    city = %location.city,
                    "Resolved IP location"
                );
                context.location = Some(ContextLocation::Resolved(location.clone()));
                Some(location)
            }
            Err(e) => {
                warn!(%ip, provider = self.lookup.name(), error = %e, "IP lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::GeoError;
    use crate::extractor::headers_from_pairs;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Lookup returning a canned answer and counting calls.
    pub(crate) struct StubLookup {
        pub answer: Result<Location>,
        pub calls: AtomicUsize,
    }

    impl StubLookup {
        pub(crate) fn ok(location: Location) -> Self {
            Self {
                answer: Ok(location),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn err(error: GeoError) -> Self {
            Self {
                answer: Err(error),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GeoLookup for StubLookup {
        async fn lookup(&self, _ip: &str) -> Result<Location> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    fn new_york() -> Location {
        Location::new(40.7, -74.0, "New York")
    }

    #[tokio::test]
    async fn test_success_sets_context() {
        let resolver = GeoResolver::new(StubLookup::ok(new_york()));
        let mut context = RequestContext::new();

        let location = resolver
            .resolve(Some("203.0.113.1"), &Headers::new(), &mut context)
            .await;

        assert_eq!(location, Some(new_york()));
        assert_eq!(
            context.location,
            Some(ContextLocation::Resolved(new_york()))
        );
    }

    #[tokio::test]
    async fn test_failures_leave_context_unset() {
        let failures = [
            GeoError::Status {
                status: "fail".to_string(),
                message: None,
            },
            GeoError::Network("connection refused".to_string()),
            GeoError::InvalidResponse("expected value".to_string()),
        ];

        for failure in failures {
            let resolver = GeoResolver::new(StubLookup::err(failure));
            let mut context = RequestContext::new();
            let location = resolver
                .resolve(Some("203.0.113.1"), &Headers::new(), &mut context)
                .await;
            assert_eq!(location, None);
            assert!(context.location.is_none());
        }
    }

    #[tokio::test]
    async fn test_no_ip_skips_lookup() {
        let stub = Arc::new(StubLookup::ok(new_york()));
        let resolver = GeoResolver::from_arc(stub.clone());
        let mut context = RequestContext::new();

        let location = resolver.resolve(Some("::1"), &Headers::new(), &mut context).await;

        assert_eq!(location, None);
        assert!(context.location.is_none());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_forwarded_ip_is_not_looked_up() {
        let stub = Arc::new(StubLookup::ok(new_york()));
        let resolver = GeoResolver::from_arc(stub.clone());
        let headers = headers_from_pairs([("x-forwarded-for", "198.51.100.1")]);
        let mut context = RequestContext::new();

        let location = resolver.resolve(None, &headers, &mut context).await;

        assert_eq!(location, None);
        assert_eq!(context.forwarded_ip(), Some("198.51.100.1"));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lookup_ip_propagates_errors() {
        let resolver = GeoResolver::new(StubLookup::err(GeoError::MissingField("lat")));
        assert_eq!(
            resolver.lookup_ip("203.0.113.1").await,
            Err(GeoError::MissingField("lat"))
        );
    }
}
