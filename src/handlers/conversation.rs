use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Hotel;
use crate::services::{booking, conversation};
use crate::state::AppState;

use super::{data, fail, ok, origin};

/// Most hotels returned by the conversational search.
const SEARCH_LIMIT: usize = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub session_id: Option<String>,
}

impl SessionRequest {
    fn required(self) -> Result<String, AppError> {
        self.session_id
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Session ID is required".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    pub session_id: Option<String>,
    pub message: Option<String>,
}

// POST /api/conversation/start
pub async fn start(State(state): State<Arc<AppState>>, body: Option<Json<SessionRequest>>) -> Response {
    let session_id = body.and_then(|Json(b)| b.session_id);
    match conversation::start_conversation(&state, session_id).await {
        Ok(started) => ok(started),
        Err(e) => fail(&state, e),
    }
}

// POST /api/conversation/message
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<MessageRequest>,
) -> Response {
    let session_id = body.session_id.unwrap_or_default();
    let message = body.message.unwrap_or_default();

    match conversation::process_message(&state, &session_id, &message, origin(&headers)).await {
        Ok(reply) => ok(reply),
        Err(e) => fail(&state, e),
    }
}

// POST /api/conversation/complete-booking
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SessionRequest>,
) -> Response {
    let result = match body.required() {
        Ok(session_id) => booking::complete_booking(&state, &session_id, origin(&headers)).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(completed) => data(StatusCode::OK, completed),
        Err(e) => fail(&state, e),
    }
}

// POST /api/conversation/force-complete
pub async fn force_complete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SessionRequest>,
) -> Response {
    let result = match body.required() {
        Ok(session_id) => booking::force_complete(&state, &session_id, origin(&headers)).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(completed) => data(StatusCode::OK, completed),
        Err(e) => fail(&state, e),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub search_term: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Serialize)]
struct SearchResponse {
    hotels: Vec<Hotel>,
    count: usize,
}

// POST /api/conversation/search-hotels
pub async fn search_hotels(State(state): State<Arc<AppState>>, Json(body): Json<SearchRequest>) -> Response {
    let mut hotels = state.catalog().search(
        body.search_term.as_deref(),
        body.city.as_deref(),
        body.min_price,
        body.max_price,
    );
    hotels.truncate(SEARCH_LIMIT);

    ok(SearchResponse {
        count: hotels.len(),
        hotels,
    })
}
