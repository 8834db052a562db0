/* src/extractor.rs */

use crate::context::{ContextLocation, RequestContext};

/// A header value as received: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

/// Request headers in arrival order. Order matters: the first matching
/// forwarding header wins.
pub type Headers = Vec<(String, HeaderValue)>;

/// Build `Headers` from name/value string pairs, one single value each.
pub fn headers_from_pairs<I, K, V>(pairs: I) -> Headers
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.into(), HeaderValue::Single(value.into())))
        .collect()
}

/// Configuration for IP extraction behavior.
#[derive(Debug, Clone)]
pub struct IpExtractor {
    /// Substring a header name must contain (case-insensitive) to be scanned.
    header_keyword: String,
    /// Whether to scan headers when the remote address is unusable.
    scan_headers: bool,
}

impl Default for IpExtractor {
    fn default() -> Self {
        Self {
            header_keyword: "forward".to_string(),
            scan_headers: true,
        }
    }
}

impl IpExtractor {
    /// Create a new IP extractor with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the substring that marks a header as a forwarding header.
    pub fn with_header_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.header_keyword = keyword.into().to_lowercase();
        self
    }

    pub fn header_keyword(&self) -> &str {
        &self.header_keyword
    }

    /// Set whether forwarding headers are scanned at all.
    pub fn scan_headers(mut self, scan: bool) -> Self {
        self.scan_headers = scan;
        self
    }

    /// Determine the caller's IP.
    ///
    /// Returns the remote address when it looks like a dotted quad. Otherwise
    /// scans forwarding headers; the first one holding a dotted quad is
    /// recorded on `context` as [`ContextLocation::Ip`] and `None` is
    /// returned. Callers must check both the return value and the context.
    pub fn extract(
        &self,
        remote_addr: Option<&str>,
        headers: &Headers,
        context: &mut RequestContext,
    ) -> Option<String> {
        if let Some(addr) = remote_addr
            && is_dotted_quad(addr)
        {
            return Some(addr.to_string());
        }

        if !self.scan_headers {
            return None;
        }

        if let Some(ip) = self.forwarded_ip(headers) {
            context.location = Some(ContextLocation::Ip { ip: ip.to_string() });
        }

        None
    }

    /// First forwarding header value that looks like an IPv4 address.
    fn forwarded_ip<'a>(&self, headers: &'a Headers) -> Option<&'a str> {
        headers.iter().find_map(|(name, value)| {
            let HeaderValue::Single(value) = value else {
                return None;
            };
            if value.is_empty() || !name.to_lowercase().contains(&self.header_keyword) {
                return None;
            }
            is_dotted_quad(value).then_some(value.as_str())
        })
    }
}

/// Check `^(\d{1,3}\.){3}\d{1,3}$`.
///
/// Octet ranges are not checked, so `999.999.999.999` passes.
pub fn is_dotted_quad(value: &str) -> bool {
    let mut groups = 0;
    for group in value.split('.') {
        groups += 1;
        if groups > 4 || group.is_empty() || group.len() > 3 {
            return false;
        }
        if !group.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    groups == 4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(remote: Option<&str>, headers: &Headers) -> (Option<String>, RequestContext) {
        let mut context = RequestContext::new();
        let ip = IpExtractor::default().extract(remote, headers, &mut context);
        (ip, context)
    }

    #[test]
    fn test_dotted_quad() {
        assert!(is_dotted_quad("192.168.1.100"));
        assert!(is_dotted_quad("0.0.0.0"));
        assert!(is_dotted_quad("999.999.999.999"));
        assert!(!is_dotted_quad("1.2.3"));
        assert!(!is_dotted_quad("1.2.3.4.5"));
        assert!(!is_dotted_quad("1.2.3.4 "));
        assert!(!is_dotted_quad("1234.1.1.1"));
        assert!(!is_dotted_quad("1..2.3"));
        assert!(!is_dotted_quad("::1"));
        assert!(!is_dotted_quad("::ffff:127.0.0.1"));
        assert!(!is_dotted_quad(""));
    }

    #[test]
    fn test_remote_addr_returned_unchanged() {
        for addr in ["127.0.0.1", "203.0.113.1", "999.999.999.999"] {
            let (ip, context) = extract(Some(addr), &Headers::new());
            assert_eq!(ip.as_deref(), Some(addr));
            assert!(context.location.is_none());
        }
    }

    #[test]
    fn test_remote_addr_wins_over_header() {
        let headers = headers_from_pairs([("x-forwarded-for", "198.51.100.1")]);
        let (ip, context) = extract(Some("203.0.113.1"), &headers);
        assert_eq!(ip.as_deref(), Some("203.0.113.1"));
        assert!(context.location.is_none());
    }

    #[test]
    fn test_invalid_remote_addr_without_headers() {
        for addr in [None, Some("::1"), Some("localhost"), Some("")] {
            let (ip, context) = extract(addr, &Headers::new());
            assert_eq!(ip, None);
            assert!(context.location.is_none());
        }
    }

    #[test]
    fn test_forward_header_sets_marker() {
        let headers = headers_from_pairs([
            ("host", "example.com"),
            ("X-Forwarded-For", "198.51.100.1"),
        ]);
        let (ip, context) = extract(Some("::1"), &headers);
        assert_eq!(ip, None);
        assert_eq!(
            context.location,
            Some(ContextLocation::Ip {
                ip: "198.51.100.1".to_string()
            })
        );
    }

    #[test]
    fn test_first_matching_header_wins() {
        let headers = headers_from_pairs([
            ("x-forwarded-host", "example.com"),
            ("forwarded-for", "192.0.2.10"),
            ("x-forwarded-for", "192.0.2.20"),
        ]);
        let (_, context) = extract(None, &headers);
        assert_eq!(context.forwarded_ip(), Some("192.0.2.10"));
    }

    #[test]
    fn test_skipped_headers() {
        let headers: Headers = vec![
            ("x-real-ip".to_string(), HeaderValue::Single("192.0.2.1".to_string())),
            ("x-forwarded-for".to_string(), HeaderValue::Single(String::new())),
            (
                "x-forwarded-for".to_string(),
                HeaderValue::Multiple(vec!["192.0.2.2".to_string()]),
            ),
            (
                "x-forwarded-for".to_string(),
                HeaderValue::Single("192.0.2.3, 10.0.0.1".to_string()),
            ),
        ];
        let (ip, context) = extract(None, &headers);
        assert_eq!(ip, None);
        assert!(context.location.is_none());
    }

    #[test]
    fn test_custom_keyword_and_disabled_scan() {
        let headers = headers_from_pairs([("X-Real-IP", "192.0.2.1")]);

        let mut context = RequestContext::new();
        let extractor = IpExtractor::new().with_header_keyword("Real-IP");
        assert_eq!(extractor.header_keyword(), "real-ip");
        extractor.extract(None, &headers, &mut context);
        assert_eq!(context.forwarded_ip(), Some("192.0.2.1"));

        let headers = headers_from_pairs([("x-forwarded-for", "192.0.2.1")]);
        let mut context = RequestContext::new();
        IpExtractor::new()
            .scan_headers(false)
            .extract(None, &headers, &mut context);
        assert!(context.location.is_none());
    }
}
