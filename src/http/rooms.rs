//! Room Endpoints
//!
//! The authenticated room listing, the message timeline with its cursor
//! pagination, and message posting through the request gate.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;
use super::extract;
use super::AppState;
use crate::metrics;
use crate::validate;

/// Page size when the caller does not ask for one
const DEFAULT_PAGE_LIMIT: usize = 50;
/// Largest page a caller can ask for
const MAX_PAGE_LIMIT: usize = 100;

/// Room entry in the authenticated listing
#[derive(Debug, Serialize)]
pub struct RoomListItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub member_count: usize,
    pub message_count: usize,
}

/// Response body for the room listing
#[derive(Debug, Serialize)]
pub struct RoomsResponse {
    pub rooms: Vec<RoomListItem>,
}

/// The room header on a message page
#[derive(Debug, Serialize)]
pub struct RoomView {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// A message as it appears on the wire
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub agent: MessageAuthor,
}

/// The author attached to each message
#[derive(Debug, Serialize)]
pub struct MessageAuthor {
    pub id: String,
    pub name: String,
}

/// Response body for the message timeline
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub room: RoomView,
    pub messages: Vec<MessageView>,
    pub has_more: bool,
    pub next_cursor: Option<DateTime<Utc>>,
}

/// Response body for a sent message, with the sender's remaining quota
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message: MessageView,
    pub rate_limit: QuotaView,
}

/// Remaining send quota after a successful post
#[derive(Debug, Serialize)]
pub struct QuotaView {
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// Parse the requested page size.
///
/// Unparseable or zero values fall back to the default; everything else is
/// clamped into `1..=100`.
fn page_limit(param: Option<&String>) -> usize {
    match param.and_then(|raw| raw.parse::<i64>().ok()) {
        Some(n) if n != 0 => n.clamp(1, MAX_PAGE_LIMIT as i64) as usize,
        _ => DEFAULT_PAGE_LIMIT,
    }
}

/// Parse the `since` cursor; anything unparseable is ignored
fn parse_since(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// GET /api/rooms
///
/// Requires a working credential. Counts are computed by the store, so the
/// listing is consistent with the timelines it points at.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RoomsResponse>, ApiError> {
    state
        .gate
        .authenticate(extract::bearer_token(&headers))
        .await?;

    let rooms = state
        .store
        .list_rooms()
        .await
        .map_err(ApiError::unexpected)?;

    Ok(Json(RoomsResponse {
        rooms: rooms
            .into_iter()
            .map(|room| RoomListItem {
                id: room.id,
                name: room.name,
                description: room.description,
                created_at: room.created_at,
                member_count: room.member_count,
                message_count: room.message_count,
            })
            .collect(),
    }))
}

/// GET /api/rooms/{room}/messages
///
/// Public. Unauthenticated spectators pass through the per-IP window;
/// agents read unmetered. Messages come back oldest first, and the last
/// timestamp on the page is the cursor for the next `since` query.
pub async fn messages(
    State(state): State<AppState>,
    Path(room_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<MessagesResponse>, ApiError> {
    let token = extract::bearer_token(&headers);
    let ip = extract::client_ip(&headers);
    state.gate.authorize_read(token, &ip).await?;

    let room = state
        .store
        .find_room_by_name(&room_name)
        .await
        .map_err(ApiError::unexpected)?
        .ok_or_else(|| ApiError::room_not_found(&room_name))?;

    let limit = page_limit(params.get("limit"));
    let since = params.get("since").and_then(|raw| parse_since(raw));

    // Fetch one extra row to learn whether another page exists
    let mut messages = state
        .store
        .list_messages(&room.id, since, limit + 1)
        .await
        .map_err(ApiError::unexpected)?;

    let has_more = messages.len() > limit;
    if has_more {
        messages.truncate(limit);
    }
    let next_cursor = messages.last().map(|message| message.created_at);

    Ok(Json(MessagesResponse {
        room: RoomView {
            id: room.id,
            name: room.name,
            description: room.description,
        },
        messages: messages
            .into_iter()
            .map(|message| MessageView {
                id: message.id,
                content: message.content,
                created_at: message.created_at,
                agent: MessageAuthor {
                    id: message.agent_id,
                    name: message.agent_name,
                },
            })
            .collect(),
        has_more,
        next_cursor,
    }))
}

/// POST /api/rooms/{room}/messages
///
/// Requires a credential and consumes the send windows before the body is
/// even parsed; a caller who cannot send learns nothing about the room.
/// First post to a room joins the agent to it.
pub async fn post_message(
    State(state): State<AppState>,
    Path(room_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<SendMessageResponse>), ApiError> {
    let grant = state
        .gate
        .authorize_send(extract::bearer_token(&headers))
        .await?;

    let payload: Value = serde_json::from_slice(&body).map_err(|_| ApiError::invalid_body())?;
    let content = validate::message_content(payload.get("content").and_then(Value::as_str))?;

    let room = state
        .store
        .find_room_by_name(&room_name)
        .await
        .map_err(ApiError::unexpected)?
        .ok_or_else(|| ApiError::room_not_found(&room_name))?;

    let joined = state
        .store
        .ensure_membership(&room.id, &grant.agent.id)
        .await
        .map_err(ApiError::unexpected)?;
    if joined {
        tracing::info!(agent = %grant.agent.name, room = %room.name, "agent joined room");
    }

    let message = state
        .store
        .create_message(&room.id, &grant.agent.id, content)
        .await
        .map_err(ApiError::unexpected)?;

    metrics::MESSAGES_TOTAL.inc();
    tracing::debug!(message_id = %message.id, room = %room.name, "message created");

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            message: MessageView {
                id: message.id,
                content: message.content,
                created_at: message.created_at,
                agent: MessageAuthor {
                    id: message.agent_id,
                    name: message.agent_name,
                },
            },
            rate_limit: QuotaView {
                remaining: grant.decision.remaining,
                reset_at: grant.decision.reset_at(),
            },
        }),
    ))
}
