mod alerts;
mod auth;
mod caregivers;
mod devices;
mod events;
mod gps;
mod medical;
mod meta;
mod patients;
mod profile;
mod subscriptions;
mod users;
mod voice;
mod webhook;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::errors::ServerError;
use crate::ports::integration::IntegrationError;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/:user_id", get(users::get_user))
        .route("/users/:user_id", put(users::update_user))
        .route("/users/:user_id", delete(users::delete_user))
        .route("/profile/:user_id", get(profile::get_profile))
        .route("/profile/:user_id", put(profile::update_profile))
        .route("/devices", post(devices::register_device))
        .route("/devices/:mac", get(devices::get_device))
        .route("/devices/:mac", put(devices::rename_device))
        .route("/alerts", get(alerts::list_alerts))
        .route("/alerts", post(alerts::create_alert))
        .route("/alerts/device/:device_id", get(alerts::list_device_alerts))
        .route("/alerts/:alert_id", patch(alerts::update_alert))
        .route("/alerts/:alert_id", delete(alerts::delete_alert))
        .route("/caregivers", get(caregivers::list_caregivers))
        .route("/caregivers", post(caregivers::create_caregiver))
        .route("/caregivers/:caregiver_id", get(caregivers::get_caregiver))
        .route("/caregivers/:caregiver_id", delete(caregivers::delete_caregiver))
        .route("/caregivers/:caregiver_id/patients", post(caregivers::link_patient))
        .route(
            "/caregivers/:caregiver_id/patients/:patient_id",
            delete(caregivers::unlink_patient),
        )
        .route("/patients", get(patients::list_patients))
        .route("/patients", post(patients::create_patient))
        .route("/patients/:patient_id", get(patients::get_patient))
        .route("/patients/:patient_id", delete(patients::delete_patient))
        .route("/patients/:patient_id/caregivers", get(patients::list_patient_caregivers))
        .route("/patients/:patient_id/medical-records", get(patients::list_patient_records))
        .route("/events", post(events::create_event))
        .route("/events/me", get(events::my_events))
        .route("/events/user/:user_id", get(events::user_events))
        .route("/events/:event_id", put(events::update_event))
        .route("/events/:event_id", delete(events::delete_event))
        .route("/medical", get(medical::list_records))
        .route("/medical", post(medical::create_record))
        .route("/medical/patient/:patient_id", get(medical::list_patient_records))
        .route("/medical/:record_id", put(medical::update_record))
        .route("/medical/:record_id", delete(medical::delete_record))
        .route(
            "/subscriptions/create-checkout-session",
            post(subscriptions::create_checkout_session),
        )
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route("/subscriptions", post(subscriptions::create_subscription))
        .route("/subscriptions/user/:user_id", get(subscriptions::latest_for_user))
        .route("/subscriptions/:subscription_id", put(subscriptions::update_subscription))
        .route("/subscriptions/:subscription_id", delete(subscriptions::delete_subscription))
        .route("/webhook", post(webhook::handle_event))
        .route("/gps/devices/:device_id/locations", get(gps::list_locations))
        .route("/gps/devices/:device_id/locations", post(gps::add_location))
        .route("/gps/devices/:device_id/location/latest", get(gps::latest_location))
        .route("/gps/route", get(gps::route))
        .route("/voice/users/:user_id/voice-logs", get(voice::list_logs))
        .route("/voice/users/:user_id/voice-logs", post(voice::ask));

    Router::new()
        .route("/health", get(meta::health))
        .route("/openapi.json", get(meta::openapi))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub(crate) fn not_found(what: &str) -> ServerError {
    ServerError::new(StatusCode::NOT_FOUND, format!("{what} not found"))
}

pub(crate) fn forbidden(message: &str) -> ServerError {
    ServerError::new(StatusCode::FORBIDDEN, message)
}

/// Callers may only touch their own user-scoped resources.
pub(crate) fn ensure_self(caller: &AuthUser, user_id: i64) -> Result<(), ServerError> {
    if caller.id == user_id {
        Ok(())
    } else {
        Err(forbidden("access denied"))
    }
}

/// Unconfigured integrations are 503, anything else upstream is 502.
pub(crate) fn upstream_error(err: IntegrationError, service: &str) -> ServerError {
    match err {
        IntegrationError::Unconfigured => ServerError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("{service} is not configured"),
        ),
        other => {
            warn!(service, error = %other, "upstream request failed");
            ServerError::new(StatusCode::BAD_GATEWAY, format!("{service} request failed"))
        }
    }
}
