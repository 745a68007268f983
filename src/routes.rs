use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let conversation = Router::new()
        .route("/start", post(handlers::conversation::start))
        .route("/message", post(handlers::conversation::send_message))
        .route("/complete-booking", post(handlers::conversation::complete_booking))
        .route("/force-complete", post(handlers::conversation::force_complete))
        .route("/search-hotels", post(handlers::conversation::search_hotels));

    let hotels = Router::new()
        .route("/", get(handlers::hotels::list_hotels))
        .route("/search", get(handlers::hotels::search))
        .route("/stats", get(handlers::hotels::stats))
        .route("/reload", post(handlers::hotels::reload))
        .route("/:id", get(handlers::hotels::get_hotel));

    let bookings = Router::new()
        .route(
            "/",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route("/stats", get(handlers::bookings::stats))
        .route(
            "/availability/:hotel_id",
            get(handlers::bookings::check_availability),
        )
        .route(
            "/:id",
            get(handlers::bookings::get_booking)
                .put(handlers::bookings::update_booking)
                .delete(handlers::bookings::delete_booking),
        );

    let voice = Router::new()
        .route(
            "/transcribe",
            post(handlers::voice::transcribe)
                .layer(DefaultBodyLimit::max(handlers::voice::MAX_AUDIO_BYTES + 64 * 1024)),
        )
        .route("/speak", post(handlers::voice::speak))
        .route("/speak-enhanced", post(handlers::voice::speak_enhanced))
        .route("/voices", get(handlers::voice::voices));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/health", get(handlers::health::health))
        .nest("/api/conversation", conversation)
        .nest("/api/hotels", hotels)
        .nest("/api/bookings", bookings)
        .nest("/api/voice", voice)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
