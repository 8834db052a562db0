/* demos/axum.rs */

use axum::{
    Router,
    http::StatusCode,
    response::{Html, Json},
    routing::get,
};
use ip2loc::{
    GeoLocationLayer, GeoResolver, IpApiProvider, RenderMode, RequestContext, StateStore,
    use_location,
};
use serde_json::json;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = create_app();
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();

    println!("Server starting on http://localhost:3000");
    println!("Test endpoints:");
    println!("  • GET /          - Page rendered with the visitor's location");
    println!("  • GET /context   - Raw request context as JSON");
    println!();
    println!("Test with headers:");
    println!("  curl -H 'X-Forwarded-For: 203.0.113.42' http://localhost:3000/context");
    println!();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

fn create_app() -> Router {
    let resolver = GeoResolver::new(IpApiProvider::default());

    Router::new()
        .route("/", get(page_handler))
        .route("/context", get(context_handler))
        .layer(GeoLocationLayer::new(resolver))
}

/// Server-render a page and embed the state payload for the client.
async fn page_handler(context: RequestContext) -> Result<Html<String>, StatusCode> {
    let mut store = StateStore::new();
    let location = use_location(&mut store, RenderMode::Server(&context))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .get();
    let payload = store
        .payload_string()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let html = format!(
        r#"
        <!DOCTYPE html>
        <html>
        <head><title>Location Demo</title></head>
        <body>
            <h1>Hello from {}!</h1>
            <p>Latitude {:.4}, longitude {:.4}</p>
            <script id="state" type="application/json">{}</script>
        </body>
        </html>
        "#,
        escape_html(&location.city),
        location.latitude,
        location.longitude,
        payload.replace('<', "\\u003c")
    );

    Ok(Html(html))
}

/// Escape text for use inside HTML element content.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Handler that returns the request context as JSON
async fn context_handler(context: RequestContext) -> Json<serde_json::Value> {
    Json(json!({
        "context": context,
        "resolved": context.resolved_location().is_some(),
        "forwarded_ip": context.forwarded_ip(),
    }))
}
