use axum::{
    http::{header, Method, StatusCode},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        health::{livez, readyz},
        placeholders::{
            create_placeholder, delete_placeholder, get_placeholder, list_placeholders,
            update_placeholder,
        },
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let placeholder_routes = Router::new()
        .route(
            "/placeholders",
            get(list_placeholders).post(create_placeholder),
        )
        .route(
            "/placeholders/{id}",
            get(get_placeholder)
                .put(update_placeholder)
                .delete(delete_placeholder),
        )
        .layer(cors);

    let request_timeout = state.request_timeout();

    Router::new()
        .route("/livez", get(livez))
        .route("/readyz", get(readyz))
        .merge(placeholder_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(state)
}
