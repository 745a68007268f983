//! The per-turn state machine that turns a chat into a booking.
//!
//! A turn appends the guest's message, asks the model for a reply, folds
//! whatever the extractor finds into the conversation's booking info and
//! then decides whether to complete. Completion happens at most once per
//! conversation; the storage layer enforces that with a conditional write.

use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BookingInfo, Conversation, ConversationMessage, ConversationStatus, Hotel, MessageRole};
use crate::services::ai::{prompt, Message};
use crate::services::booking;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedConversation {
    pub session_id: String,
    pub conversation_id: String,
    pub message: String,
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReply {
    pub session_id: String,
    pub conversation_id: String,
    /// What the guest sees: marker removed, payment link appended on
    /// completion.
    pub message: String,
    pub messages: Vec<ConversationMessage>,
    pub booking_details: BookingInfo,
    pub suggested_hotels: Option<Vec<Hotel>>,
}

/// `session_<millis>_<9 random chars>`.
pub fn generate_session_id() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("session_{}_{suffix}", Utc::now().timestamp_millis())
}

fn new_conversation(session_id: &str) -> Conversation {
    let now = Utc::now();
    Conversation {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        messages: vec![ConversationMessage {
            role: MessageRole::Assistant,
            content: prompt::GREETING.to_string(),
            timestamp: now,
        }],
        booking_info: BookingInfo::default(),
        status: ConversationStatus::Active,
        created_at: now,
        updated_at: now,
        completed_at: None,
    }
}

fn load_or_create(conn: &Connection, session_id: &str) -> anyhow::Result<Conversation> {
    if let Some(conv) = queries::get_conversation(conn, session_id)? {
        return Ok(conv);
    }
    let conv = new_conversation(session_id);
    queries::save_conversation(conn, &conv)?;
    tracing::info!(session_id, conversation_id = %conv.id, "conversation created");
    Ok(conv)
}

fn reload(state: &AppState, session_id: &str) -> Result<Conversation, AppError> {
    queries::get_conversation(&state.db(), session_id)?.ok_or_else(|| AppError::NotFound("Conversation".to_string()))
}

/// Returns the session's conversation, creating it with the greeting when
/// it doesn't exist yet.
pub async fn start_conversation(state: &AppState, session_id: Option<String>) -> Result<StartedConversation, AppError> {
    let session_id = session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(generate_session_id);

    let _turn = state.lock_session(&session_id).await;
    let conv = load_or_create(&state.db(), &session_id)?;

    Ok(StartedConversation {
        message: conv.last_content().unwrap_or(prompt::GREETING).to_string(),
        session_id: conv.session_id,
        conversation_id: conv.id,
        messages: conv.messages,
    })
}

/// Runs one turn for `session_id`. `origin` roots the payment link.
pub async fn process_message(
    state: &AppState,
    session_id: &str,
    message: &str,
    origin: Option<&str>,
) -> Result<TurnReply, AppError> {
    let message = message.trim();
    if session_id.trim().is_empty() || message.is_empty() {
        return Err(AppError::Validation("Session ID and message are required".to_string()));
    }

    let _turn = state.lock_session(session_id).await;

    let conversation = {
        let conn = state.db();
        load_or_create(&conn, session_id)?;
        queries::append_message(&conn, session_id, MessageRole::User, message)?
            .ok_or_else(|| AppError::NotFound("Conversation".to_string()))?
    };

    let response = ask_model(state, &conversation).await?;
    let conversation = queries::append_message(&state.db(), session_id, MessageRole::Assistant, &response)?
        .ok_or_else(|| AppError::NotFound("Conversation".to_string()))?;

    let extracted = state.extractor.extract(&conversation.messages);
    let info = persist_merge(state, session_id, &conversation.booking_info, &extracted)?;

    tracing::info!(
        session_id,
        status = conversation.status.as_str(),
        ready = info.has_booking_info(),
        "turn processed"
    );

    let visible = if prompt::signals_completion(&response) {
        complete_on_marker(state, &conversation, info, &response, origin)?
    } else if conversation.is_active() {
        complete_on_fallback(state, session_id, info, &response, origin)?
    } else {
        response
    };

    let location = extracted
        .location
        .clone()
        .or_else(|| conversation.booking_info.location.clone());
    let suggested_hotels = location
        .filter(|_| mentions_hotels(&visible))
        .map(|location| state.catalog().find_matching(&location));

    let conversation = reload(state, session_id)?;
    Ok(TurnReply {
        session_id: conversation.session_id,
        conversation_id: conversation.id,
        message: visible,
        messages: conversation.messages,
        booking_details: conversation.booking_info,
        suggested_hotels,
    })
}

async fn ask_model(state: &AppState, conversation: &Conversation) -> Result<String, AppError> {
    let location = state
        .extractor
        .locate(&conversation.messages)
        .or_else(|| conversation.booking_info.location.clone());
    let hotels = location
        .as_deref()
        .map(|l| state.catalog().find_matching(l))
        .unwrap_or_default();

    let system = prompt::system_prompt(location.as_deref(), &hotels);
    let history: Vec<Message> = conversation.messages.iter().map(Message::from).collect();

    state.llm.chat(&system, &history).await.map_err(AppError::Upstream)
}

/// Merges `update` into `current` and stores the result when it changed.
fn persist_merge(
    state: &AppState,
    session_id: &str,
    current: &BookingInfo,
    update: &BookingInfo,
) -> Result<BookingInfo, AppError> {
    let merged = current.merged(update);
    if merged != *current {
        queries::update_booking_info(&state.db(), session_id, &merged)?;
    }
    Ok(merged)
}

/// Extracts again from the stored conversation and merges onto `info`.
fn refresh(state: &AppState, session_id: &str, info: &BookingInfo) -> Result<BookingInfo, AppError> {
    let conversation = reload(state, session_id)?;
    let extracted = state.extractor.extract(&conversation.messages);
    persist_merge(state, session_id, info, &extracted)
}

/// The model emitted the marker. The marker never reaches the guest; the
/// booking is attempted only while the conversation is still active.
fn complete_on_marker(
    state: &AppState,
    conversation: &Conversation,
    mut info: BookingInfo,
    response: &str,
    origin: Option<&str>,
) -> Result<String, AppError> {
    let session_id = conversation.session_id.as_str();
    let mut visible = prompt::strip_completion_marker(response);

    if conversation.is_active() {
        if !info.has_guest_identity() {
            info = refresh(state, session_id, &info)?;
        }
        if let Some(link) = finalize(state, session_id, &info, origin) {
            visible = prompt::with_payment_link(&visible, &link);
        }
    } else {
        tracing::info!(session_id, "completion marker on a finished conversation, ignored");
    }

    queries::replace_last_assistant_message(&state.db(), session_id, &visible)?;
    Ok(visible)
}

/// No marker: complete anyway once the guest's name and email are known.
/// The model doesn't always emit the marker.
fn complete_on_fallback(
    state: &AppState,
    session_id: &str,
    info: BookingInfo,
    response: &str,
    origin: Option<&str>,
) -> Result<String, AppError> {
    let info = refresh(state, session_id, &info)?;
    if !info.has_guest_identity() {
        return Ok(response.to_string());
    }

    tracing::info!(session_id, "guest identified without completion marker, completing");
    let Some(link) = finalize(state, session_id, &info, origin) else {
        return Ok(response.to_string());
    };

    let visible = prompt::with_payment_link(response, &link);
    queries::replace_last_assistant_message(&state.db(), session_id, &visible)?;
    Ok(visible)
}

/// Books and completes; returns the payment link. A failure leaves the
/// conversation active so a later turn can retry.
fn finalize(state: &AppState, session_id: &str, info: &BookingInfo, origin: Option<&str>) -> Option<String> {
    match booking::complete_with_defaults(state, session_id, info) {
        Ok(booking) => {
            tracing::info!(
                session_id,
                booking_id = %booking.id,
                hotel_id = %booking.hotel_id,
                total = booking.total_amount,
                "booking created from conversation"
            );
            Some(prompt::payment_link(origin, &state.config.frontend_url, &booking.id))
        }
        Err(e) => {
            tracing::warn!(session_id, error = %e, "booking completion failed, will retry next turn");
            None
        }
    }
}

fn mentions_hotels(text: &str) -> bool {
    let text = text.to_lowercase();
    text.contains("hotel") || text.contains("suggest")
}
