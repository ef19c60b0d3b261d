use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod bookings;
pub mod error;
pub mod middleware;
pub mod payments;
pub mod state;
pub mod trips;
pub mod worker;

pub use state::AppState;

/// Routes that require no credentials: browsing trips, placing a booking
/// and paying for it.
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips", get(trips::list_trips))
        .route("/v1/trips/{id}", get(trips::get_trip))
        .route("/v1/seat-layout", get(trips::seat_layout))
        .route("/v1/bookings", post(bookings::create_booking))
        .route("/v1/bookings/{id}", get(bookings::get_booking))
        .route("/v1/bookings/{id}/payments", post(payments::record_payment))
}

/// Routes for transport-office staff; every handler receives validated
/// `OperatorClaims` from the auth middleware.
fn operator_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/trips", post(trips::create_trip))
        .route("/v1/trips/{id}/cancel", post(trips::cancel_trip))
        .route("/v1/bookings/{id}/status", post(bookings::change_status))
        .route("/v1/payments/{id}/settle", post(payments::settle_payment))
        .route(
            "/v1/offices/{id}/bookings",
            get(bookings::list_office_bookings),
        )
        .route("/v1/admin/assembly-points", post(admin::create_assembly_point))
        .route("/v1/admin/buses", post(admin::create_bus))
        .route("/v1/admin/routes", post(admin::create_route))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::operator_auth_middleware,
        ))
}

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(public_routes())
        .merge(operator_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
