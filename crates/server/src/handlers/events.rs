use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use tracing::info;

use super::{forbidden, not_found};
use crate::app_state::AppState;
use crate::auth::{AuthUser, auth_user};
use crate::errors::{ServerError, map_db_error};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{Event, EventRequest};
use crate::ports::repo::{EventUpdate, NewEvent, Repo};
use crate::validate::{bad_request, parse_optional_timestamp, required_text, trimmed};

fn check_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ServerError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => {
            Err(bad_request("end_time must not be before start_time"))
        }
        _ => Ok(()),
    }
}

async fn owned_event(repo: &dyn Repo, caller: &AuthUser, event_id: i64) -> Result<Event, ServerError> {
    let event = repo
        .get_event(event_id)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("event"))?;
    if event.user_id != caller.id {
        return Err(forbidden("you can only modify your own events"));
    }
    Ok(event)
}

pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<EventRequest>,
) -> Result<(StatusCode, Json<Event>), ServerError> {
    let caller = auth_user(&state, &headers)?;
    let title = required_text(payload.title, "title")?;
    let start_time = parse_optional_timestamp(payload.start_time, "start_time")?;
    let end_time = parse_optional_timestamp(payload.end_time, "end_time")?;
    check_range(start_time, end_time)?;

    let event = state
        .repo
        .create_event(&NewEvent {
            user_id: caller.id,
            title,
            description: trimmed(payload.description),
            start_time,
            end_time,
            event_type: trimmed(payload.event_type),
        })
        .await
        .map_err(|e| map_db_error(e, "event already exists"))?;

    info!(event_id = event.id, user_id = caller.id, "event created");
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn my_events(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Event>>, ServerError> {
    let caller = auth_user(&state, &headers)?;
    let events = state
        .repo
        .list_events_for_user(caller.id)
        .await
        .map_err(ServerError::internal)?;
    Ok(Json(events))
}

pub async fn user_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<Vec<Event>>, ServerError> {
    auth_user(&state, &headers)?;
    let events = state
        .repo
        .list_events_for_user(user_id)
        .await
        .map_err(ServerError::internal)?;
    Ok(Json(events))
}

pub async fn update_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(event_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<EventRequest>,
) -> Result<Json<Event>, ServerError> {
    let caller = auth_user(&state, &headers)?;
    let existing = owned_event(state.repo.as_ref(), &caller, event_id).await?;

    let start_time = parse_optional_timestamp(payload.start_time, "start_time")?;
    let end_time = parse_optional_timestamp(payload.end_time, "end_time")?;
    check_range(
        start_time.or(existing.start_time),
        end_time.or(existing.end_time),
    )?;

    let update = EventUpdate {
        title: trimmed(payload.title),
        description: trimmed(payload.description),
        start_time,
        end_time,
        event_type: trimmed(payload.event_type),
    };
    let event = state
        .repo
        .update_event(event_id, &update)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("event"))?;
    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(event_id): ApiPath<i64>,
) -> Result<StatusCode, ServerError> {
    let caller = auth_user(&state, &headers)?;
    owned_event(state.repo.as_ref(), &caller, event_id).await?;
    let deleted = state
        .repo
        .delete_event(event_id)
        .await
        .map_err(ServerError::internal)?;
    if !deleted {
        return Err(not_found("event"));
    }
    info!(event_id, user_id = caller.id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}
