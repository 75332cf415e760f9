use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{
    Actor, BookingId, BookingRequest, BookingStatus, ListingId, ReviewId, ReviewRequest, Role,
};
use super::error::{ErrorKind, MarketplaceError};
use super::repository::{MarketplaceStore, NotificationPublisher};
use super::service::MarketplaceService;

/// Header carrying the authenticated user id, set by the upstream identity layer.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the authenticated user's role (`tenant`, `owner`, or `admin`).
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

type SharedService<S, N> = Arc<MarketplaceService<S, N>>;

/// Router builder exposing the booking, review, and rating endpoints.
pub fn marketplace_router<S, N>(service: SharedService<S, N>) -> Router
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/bookings", post(create_booking_handler::<S, N>))
        .route(
            "/api/v1/bookings/:booking_id",
            get(get_booking_handler::<S, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/status",
            post(transition_booking_handler::<S, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/complete",
            post(complete_booking_handler::<S, N>),
        )
        .route(
            "/api/v1/bookings/:booking_id/cancel",
            post(cancel_booking_handler::<S, N>),
        )
        .route("/api/v1/reviews", post(create_review_handler::<S, N>))
        .route(
            "/api/v1/reviews/:review_id/reply",
            post(reply_handler::<S, N>),
        )
        .route(
            "/api/v1/listings/:listing_id/bookings",
            get(listing_bookings_handler::<S, N>),
        )
        .route(
            "/api/v1/listings/:listing_id/reviews",
            get(listing_reviews_handler::<S, N>),
        )
        .route(
            "/api/v1/listings/:listing_id/rating",
            get(listing_rating_handler::<S, N>),
        )
        .route(
            "/api/v1/listings/:listing_id/rating/recompute",
            post(recompute_rating_handler::<S, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionRequest {
    #[serde(default)]
    pub(crate) status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReplyRequest {
    #[serde(default)]
    pub(crate) reply: String,
}

/// Resolves the caller from identity headers, answering 401 when they are absent or malformed.
pub(crate) fn resolve_actor(headers: &HeaderMap) -> Result<Actor, Response> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let id = header(ACTOR_ID_HEADER).ok_or_else(|| unauthorized("missing caller identity"))?;
    let role = header(ACTOR_ROLE_HEADER)
        .ok_or_else(|| unauthorized("missing caller role"))?
        .parse::<Role>()
        .map_err(|err| unauthorized(&err))?;

    Ok(Actor::new(id, role))
}

fn unauthorized(message: &str) -> Response {
    let payload = json!({
        "error": message,
        "kind": "unauthorized",
    });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

pub(crate) fn error_response(err: MarketplaceError) -> Response {
    let kind = err.kind();
    let status = match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::InvalidState => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = if kind == ErrorKind::Unavailable {
        error!(error = %err, "marketplace storage failure");
        "storage unavailable".to_string()
    } else {
        err.to_string()
    };

    let payload = json!({
        "error": message,
        "kind": kind.label(),
    });
    (status, Json(payload)).into_response()
}

/// Unwraps a JSON body, reporting malformed or mistyped payloads as invalid input.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| error_response(MarketplaceError::InvalidInput(rejection.body_text())))
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, MarketplaceError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_booking_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    headers: HeaderMap,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match resolve_actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    respond(StatusCode::CREATED, service.create_booking(&actor, request))
}

pub(crate) async fn get_booking_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match resolve_actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service.get_booking(&actor, &BookingId(booking_id)),
    )
}

pub(crate) async fn transition_booking_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
    payload: Result<Json<TransitionRequest>, JsonRejection>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match resolve_actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let requested = match request.status.parse::<BookingStatus>() {
        Ok(status) => status,
        Err(message) => return error_response(MarketplaceError::InvalidInput(message)),
    };
    respond(
        StatusCode::OK,
        service.transition_booking(&actor, &BookingId(booking_id), requested),
    )
}

pub(crate) async fn complete_booking_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match resolve_actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service.complete_booking(&actor, &BookingId(booking_id)),
    )
}

pub(crate) async fn cancel_booking_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match resolve_actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service.cancel_booking(&actor, &BookingId(booking_id)),
    )
}

pub(crate) async fn listing_bookings_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match resolve_actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service.bookings_for_listing(&actor, &ListingId(listing_id)),
    )
}

pub(crate) async fn create_review_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    headers: HeaderMap,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match resolve_actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    respond(StatusCode::CREATED, service.create_review(&actor, request))
}

pub(crate) async fn reply_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    headers: HeaderMap,
    Path(review_id): Path<String>,
    payload: Result<Json<ReplyRequest>, JsonRejection>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match resolve_actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service.reply_to_review(&actor, &ReviewId(review_id), &request.reply),
    )
}

pub(crate) async fn listing_reviews_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Path(listing_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.reviews_for_listing(&ListingId(listing_id)),
    )
}

pub(crate) async fn listing_rating_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    Path(listing_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    respond(StatusCode::OK, service.listing_rating(&ListingId(listing_id)))
}

pub(crate) async fn recompute_rating_handler<S, N>(
    State(service): State<SharedService<S, N>>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    let actor = match resolve_actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service.recompute_listing_rating(&actor, &ListingId(listing_id)),
    )
}
