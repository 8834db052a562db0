/* demos/demo.rs */

use ip2loc::{
    GeoResolver, HeaderValue, Headers, IpExtractor, IpLookupResponse, RenderMode, RequestContext,
    StateStore, headers_from_pairs, use_location,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    println!("=== IP Location Examples ===\n");

    // Example 1: Socket address is used directly
    example_1_remote_addr();

    // Example 2: Forwarding header fallback
    example_2_forwarding_header();

    // Example 3: Headers that are ignored
    example_3_ignored_headers();

    // Example 4: Parsing service responses
    example_4_responses();

    // Example 5: Server render, then client hydration
    example_5_render_and_hydrate();

    // Example 6: Live lookup (needs network)
    if std::env::args().any(|arg| arg == "--live") {
        example_6_live_lookup().await;
    }

    println!("=== All examples completed! ===");
}

fn example_1_remote_addr() {
    println!("Example 1: Socket address");

    let mut context = RequestContext::new();
    match IpExtractor::new().extract(Some("203.0.113.45"), &Headers::new(), &mut context) {
        Some(ip) => println!("Extracted IP: {}", ip),
        None => println!("No IP found"),
    }
    println!();
}

fn example_2_forwarding_header() {
    println!("Example 2: Forwarding header");

    let headers = headers_from_pairs([
        ("host", "example.com"),
        ("X-Forwarded-For", "198.51.100.42"),
    ]);
    let mut context = RequestContext::new();
    let ip = IpExtractor::new().extract(Some("::ffff:10.0.0.1"), &headers, &mut context);

    println!("Returned IP: {:?}", ip);
    println!("Context marker: {:?}", context.location);
    println!();
}

fn example_3_ignored_headers() {
    println!("Example 3: Ignored headers");

    let headers: Headers = vec![
        ("x-real-ip".to_string(), HeaderValue::Single("192.0.2.1".to_string())),
        (
            "x-forwarded-for".to_string(),
            HeaderValue::Single("203.0.113.1, 10.0.0.5".to_string()),
        ),
        (
            "forwarded".to_string(),
            HeaderValue::Multiple(vec!["192.0.2.2".to_string()]),
        ),
    ];
    let mut context = RequestContext::new();
    IpExtractor::new().extract(None, &headers, &mut context);

    println!("Headers present:");
    for (name, value) in &headers {
        println!("  {}: {:?}", name, value);
    }
    println!("Context marker: {:?}", context.location);
    println!();
}

fn example_4_responses() {
    println!("Example 4: Service responses");

    let bodies = [
        r#"{"status":"success","lat":40.7,"lon":-74.0,"city":"New York"}"#,
        r#"{"status":"fail","message":"private range","query":"10.0.0.1"}"#,
        "not json",
    ];
    for body in bodies {
        let result = IpLookupResponse::from_json(body).and_then(IpLookupResponse::into_location);
        match result {
            Ok(location) => println!("  {} -> {:?}", body, location),
            Err(e) => println!("  {} -> {}", body, e),
        }
    }
    println!();
}

fn example_5_render_and_hydrate() {
    println!("Example 5: Render and hydrate");

    let context = RequestContext::new();
    let mut server = StateStore::new();
    let location = use_location(&mut server, RenderMode::Server(&context))
        .map(|state| state.get());
    println!("Server location: {:?}", location);

    match server.payload_string() {
        Ok(payload) => {
            println!("Payload: {}", payload);
            let client = StateStore::hydrate_from_str(&payload).map(|mut client| {
                use_location(&mut client, RenderMode::Client).map(|state| state.get())
            });
            println!("Client location: {:?}", client);
        }
        Err(e) => println!("Payload error: {}", e),
    }
    println!();
}

async fn example_6_live_lookup() {
    println!("Example 6: Live lookup");

    let resolver = GeoResolver::default();
    match resolver.lookup_ip("8.8.8.8").await {
        Ok(location) => println!("8.8.8.8 -> {:?}", location),
        Err(e) => println!("Lookup failed: {}", e),
    }
    println!();
}
