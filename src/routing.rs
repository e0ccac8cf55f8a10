//! Application router configuration.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState, endpoints,
    logging::logging_middleware,
    not_found::get_404_not_found,
    sms::{get_unprocessed_sms_endpoint, parse_sms_endpoint, process_sms_endpoint},
};

/// Return a router with all the app's routes.
///
/// Requests are expected to have been authenticated by an upstream gateway;
/// the user ID in the path is trusted.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::PARSE_SMS, post(parse_sms_endpoint))
        .route(endpoints::UNPROCESSED_SMS, get(get_unprocessed_sms_endpoint))
        .route(endpoints::PROCESS_SMS, post(process_sms_endpoint))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_health() -> &'static str {
    "ok"
}
