//! Payment processor callbacks. Only completed checkouts change state.
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::{Months, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::auth::hash_token;
use crate::errors::{ServerError, map_db_error};
use crate::models::WebhookAck;
use crate::ports::repo::NewSubscription;
use crate::validate::bad_request;

const SECRET_HEADER: &str = "x-webhook-secret";
const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, PartialEq)]
struct CompletedCheckout {
    user_id: i64,
    plan: String,
}

/// Metadata values arrive as strings from the processor; numbers are accepted too.
fn metadata_user_id(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn completed_checkout(event: &Value) -> Option<CompletedCheckout> {
    let metadata = event.pointer("/data/object/metadata")?;
    let user_id = metadata_user_id(metadata.get("user_id")?)?;
    let plan = metadata
        .get("plan")?
        .as_str()
        .map(str::trim)
        .filter(|p| !p.is_empty())?;
    Some(CompletedCheckout {
        user_id,
        plan: plan.to_string(),
    })
}

fn check_secret(state: &AppState, headers: &HeaderMap) -> Result<(), ServerError> {
    let Some(expected) = state.billing.webhook_secret.as_deref() else {
        return Ok(());
    };
    let provided = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if hash_token(provided) == hash_token(expected) {
        Ok(())
    } else {
        Err(ServerError::new(
            StatusCode::UNAUTHORIZED,
            "invalid webhook secret",
        ))
    }
}

pub async fn handle_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ServerError> {
    check_secret(&state, &headers)?;

    let event: Value =
        serde_json::from_slice(&body).map_err(|_| bad_request("malformed webhook payload"))?;
    let kind = event
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("malformed webhook payload"))?;

    if kind != CHECKOUT_COMPLETED {
        info!(kind, "webhook event ignored");
        return Ok(Json(WebhookAck { received: true }));
    }

    let checkout = completed_checkout(&event)
        .ok_or_else(|| bad_request("checkout session metadata requires user_id and plan"))?;
    let Some(plan) = state.billing.plan(&checkout.plan) else {
        warn!(plan = %checkout.plan, "checkout completed for unknown plan");
        return Err(bad_request("invalid plan selected"));
    };
    let renewal_date = Utc::now()
        .checked_add_months(Months::new(plan.months))
        .ok_or_else(|| ServerError::internal("renewal date out of range"))?;

    let subscription = state
        .repo
        .activate_subscription(&NewSubscription {
            user_id: checkout.user_id,
            plan: plan.name.clone(),
            status: "active".to_string(),
            renewal_date,
        })
        .await
        .map_err(|e| map_db_error(e, "subscription already exists"))?;

    info!(
        subscription_id = subscription.id,
        user_id = checkout.user_id,
        plan = %subscription.plan,
        "subscription activated"
    );
    Ok(Json(WebhookAck { received: true }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn metadata_is_read_from_the_session_object() {
        let event = json!({
            "type": "checkout.session.completed",
            "data": {"object": {"metadata": {"user_id": "42", "plan": "premium_3m"}}}
        });
        assert_eq!(
            completed_checkout(&event),
            Some(CompletedCheckout {
                user_id: 42,
                plan: "premium_3m".into()
            })
        );
    }

    #[test]
    fn numeric_ids_are_accepted_and_gaps_rejected() {
        assert_eq!(metadata_user_id(&json!(7)), Some(7));
        assert_eq!(metadata_user_id(&json!("x7")), None);

        let no_plan = json!({"data": {"object": {"metadata": {"user_id": 1}}}});
        assert_eq!(completed_checkout(&no_plan), None);
        assert_eq!(completed_checkout(&json!({"data": {}})), None);
    }
}
