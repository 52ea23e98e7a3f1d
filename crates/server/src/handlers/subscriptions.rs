use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::info;

use super::{not_found, upstream_error};
use crate::app_state::AppState;
use crate::auth::auth_user;
use crate::errors::{ServerError, map_db_error};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{
    CheckoutResponse, CheckoutSessionRequest, CreateSubscriptionRequest, Subscription,
    UpdateSubscriptionRequest,
};
use crate::ports::integration::CheckoutRequest;
use crate::ports::repo::{NewSubscription, SubscriptionUpdate};
use crate::validate::{
    bad_request, parse_optional_timestamp, parse_timestamp, required_id, required_text, trimmed,
};

pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CheckoutSessionRequest>,
) -> Result<Json<CheckoutResponse>, ServerError> {
    let caller = auth_user(&state, &headers)?;
    let plan_name = required_text(payload.plan, "plan")?;
    let plan = state
        .billing
        .plan(&plan_name)
        .ok_or_else(|| bad_request("invalid plan selected"))?;
    let user_id = payload.user_id.unwrap_or(caller.id);

    let frontend = &state.billing.frontend_url;
    let request = CheckoutRequest {
        price_id: plan.price_id.clone(),
        customer_email: caller.email.clone(),
        success_url: format!("{frontend}/subscription-success?session_id={{CHECKOUT_SESSION_ID}}"),
        cancel_url: format!("{frontend}/subscription-cancelled"),
        user_id,
        plan: plan.name.clone(),
    };
    let url = state
        .billing
        .payments
        .create_checkout_session(&request)
        .await
        .map_err(|e| upstream_error(e, "payment processor"))?;

    info!(user_id, plan = %plan.name, "checkout session created");
    Ok(Json(CheckoutResponse { url }))
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Subscription>>, ServerError> {
    auth_user(&state, &headers)?;
    let subscriptions = state
        .repo
        .list_subscriptions()
        .await
        .map_err(ServerError::internal)?;
    Ok(Json(subscriptions))
}

pub async fn latest_for_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<Subscription>, ServerError> {
    auth_user(&state, &headers)?;
    let subscription = state
        .repo
        .latest_subscription_for_user(user_id)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("subscription"))?;
    Ok(Json(subscription))
}

pub async fn create_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<Subscription>), ServerError> {
    auth_user(&state, &headers)?;
    let user_id = required_id(payload.user_id, "user_id")?;
    let plan = required_text(payload.plan, "plan")?;
    let status = required_text(payload.status, "status")?;
    let renewal_raw = required_text(payload.renewal_date, "renewal_date")?;
    let renewal_date = parse_timestamp(&renewal_raw, "renewal_date")?;

    let subscription = state
        .repo
        .create_subscription(&NewSubscription {
            user_id,
            plan,
            status,
            renewal_date,
        })
        .await
        .map_err(|e| map_db_error(e, "subscription already exists"))?;
    info!(subscription_id = subscription.id, user_id, "subscription created");
    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn update_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(subscription_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateSubscriptionRequest>,
) -> Result<Json<Subscription>, ServerError> {
    auth_user(&state, &headers)?;
    let update = SubscriptionUpdate {
        plan: trimmed(payload.plan),
        status: trimmed(payload.status),
        renewal_date: parse_optional_timestamp(payload.renewal_date, "renewal_date")?,
    };
    let subscription = state
        .repo
        .update_subscription(subscription_id, &update)
        .await
        .map_err(ServerError::internal)?
        .ok_or_else(|| not_found("subscription"))?;
    Ok(Json(subscription))
}

pub async fn delete_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(subscription_id): ApiPath<i64>,
) -> Result<StatusCode, ServerError> {
    auth_user(&state, &headers)?;
    let deleted = state
        .repo
        .delete_subscription(subscription_id)
        .await
        .map_err(ServerError::internal)?;
    if !deleted {
        return Err(not_found("subscription"));
    }
    Ok(StatusCode::NO_CONTENT)
}
