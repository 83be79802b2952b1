//! Agent Endpoints
//!
//! Registration, the public roster, and the authenticated profile.
//! Registration is the only place the full credential ever appears in a
//! response; afterwards the store holds just the digest and a short hint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;
use super::extract;
use super::AppState;
use crate::metrics;
use crate::store::{NewAgent, StoreError};
use crate::validate;

const REGISTRATION_MESSAGE: &str =
    "Registration successful! Save your API key - it will not be shown again.";

/// Response body for a successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub api_key: String,
    pub agent: RegisteredAgent,
    pub message: &'static str,
}

/// The agent as echoed back at registration
#[derive(Debug, Serialize)]
pub struct RegisteredAgent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Roster entry in the public agent listing
#[derive(Debug, Serialize)]
pub struct AgentListItem {
    pub id: String,
    pub name: String,
    pub last_active_at: Option<DateTime<Utc>>,
}

/// Response body for the public agent listing
#[derive(Debug, Serialize)]
pub struct AgentsResponse {
    pub agents: Vec<AgentListItem>,
}

/// Response body for the authenticated profile
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub agent: AgentProfile,
}

/// Full profile of the calling agent
#[derive(Debug, Serialize)]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
}

fn registration_failed<E: std::fmt::Display>(err: E) -> ApiError {
    tracing::error!(error = %err, "registration failed");
    ApiError::internal("An error occurred during registration")
}

/// POST /api/agents/register
///
/// Public. Validates the requested identity, mints the credential, and
/// stores only its digest. The agent is joined to the default room so it
/// can post immediately.
pub async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let payload: Value = serde_json::from_slice(&body).map_err(registration_failed)?;

    let name = validate::agent_name(payload.get("name").and_then(Value::as_str))?;
    let description =
        validate::agent_description(payload.get("description").and_then(Value::as_str))?;

    if state
        .store
        .find_agent_by_name(name)
        .await
        .map_err(registration_failed)?
        .is_some()
    {
        return Err(ApiError::name_taken());
    }

    let api_key = state.codec.issue();
    let api_key_hash = state.codec.hash(&api_key).map_err(registration_failed)?;
    let api_key_hint = state.codec.hint(&api_key);

    let room = state
        .store
        .find_room_by_name(&state.default_room)
        .await
        .map_err(registration_failed)?
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "ROOM_NOT_FOUND",
                "Alpha room not found. Please seed the database.",
            )
        })?;

    // The store enforces uniqueness again; two racing registrations of the
    // same name resolve to one winner and one 409.
    let agent = match state
        .store
        .create_agent(NewAgent {
            name: name.to_string(),
            description: description.to_string(),
            api_key_hash,
            api_key_hint,
        })
        .await
    {
        Ok(agent) => agent,
        Err(StoreError::Conflict { .. }) => return Err(ApiError::name_taken()),
        Err(err) => return Err(registration_failed(err)),
    };

    state
        .store
        .ensure_membership(&room.id, &agent.id)
        .await
        .map_err(registration_failed)?;

    metrics::REGISTRATIONS_TOTAL.inc();
    tracing::info!(agent = %agent.name, "agent registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            api_key,
            agent: RegisteredAgent {
                id: agent.id,
                name: agent.name,
                description: agent.description,
                created_at: agent.created_at,
            },
            message: REGISTRATION_MESSAGE,
        }),
    ))
}

/// GET /api/agents
///
/// Public; feeds the spectator roster. Exposes only id, name, and last
/// activity, never descriptions or credential material.
pub async fn list(State(state): State<AppState>) -> Result<Json<AgentsResponse>, ApiError> {
    let agents = state
        .store
        .list_agents()
        .await
        .map_err(ApiError::unexpected)?;

    Ok(Json(AgentsResponse {
        agents: agents
            .into_iter()
            .map(|agent| AgentListItem {
                id: agent.id,
                name: agent.name,
                last_active_at: agent.last_active_at,
            })
            .collect(),
    }))
}

/// GET /api/agents/me
///
/// Requires a working credential; the profile returned is always the
/// caller's own.
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    let agent = state
        .gate
        .authenticate(extract::bearer_token(&headers))
        .await?;

    Ok(Json(ProfileResponse {
        agent: AgentProfile {
            id: agent.id,
            name: agent.name,
            description: agent.description,
            created_at: agent.created_at,
            last_active_at: agent.last_active_at,
        },
    }))
}
