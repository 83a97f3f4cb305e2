//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                    - Subscribe page with today's picks
//! GET  /health              - Health check
//!
//! # Subscription lifecycle
//! POST /api/subscribe       - Start a subscription (form or JSON)
//! GET  /api/confirm         - Confirm via signed emailed link
//! GET  /api/unsubscribe     - Unsubscribe via signed emailed link
//!
//! # Internal (bearer shared-secret)
//! GET  /api/subscribers     - Full subscriber list
//! POST /api/store_picks     - Overwrite the day's picks
//! ```
//!
//! Dispatch is by exact method and path; anything else falls through to a
//! generic 404 page. The `/api` subtree carries a permissive CORS layer
//! (any origin, GET/POST/OPTIONS, Content-Type/Authorization), which also
//! answers preflight requests.

pub mod admin;
pub mod home;
pub mod links;
pub mod subscribe;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::{Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Shared page for success, idempotent, and error outcomes.
#[derive(Template, WebTemplate)]
#[template(path = "message.html")]
pub struct MessagePage {
    pub title: String,
    pub message: String,
}

/// CORS policy for the API subtree.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Create the API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe::subscribe))
        .route("/confirm", get(links::confirm))
        .route("/unsubscribe", get(links::unsubscribe))
        .route("/subscribers", get(admin::list_subscribers))
        .route("/store_picks", post(admin::store_picks))
        .layer(cors_layer())
}

/// Create all routes for the service.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/api", api_routes())
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
}

/// Generic 404 page for unmatched method/path combinations.
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        MessagePage {
            title: "Not found".to_string(),
            message: "There's nothing at this address.".to_string(),
        },
    )
}
