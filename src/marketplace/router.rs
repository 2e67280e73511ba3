use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Datelike, Local};
use serde::Deserialize;
use serde_json::json;

use super::availability::DayOfWeek;
use super::booking::{BookingError, BookingRequest};
use super::catalog;
use super::domain::TutorId;
use super::payment::{PaymentProcessor, PaymentStatus};
use super::repository::{IdentityProvider, MarketplaceRepository, RepositoryError};
use super::search::{GeoPoint, SearchContext, TutorSearchFilter};
use super::service::{BookingServiceError, MarketplaceService};
use super::session::SessionDuration;

/// Router builder exposing the marketplace HTTP surface.
pub fn marketplace_router<R, P, I>(service: Arc<MarketplaceService<R, P, I>>) -> Router
where
    R: MarketplaceRepository + 'static,
    P: PaymentProcessor + 'static,
    I: IdentityProvider + 'static,
{
    Router::new()
        .route("/api/v1/subjects", get(subjects_handler))
        .route("/api/v1/tutors/search", post(search_handler::<R, P, I>))
        .route("/api/v1/bookings/quote", post(quote_handler::<R, P, I>))
        .route("/api/v1/bookings", post(book_handler::<R, P, I>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchRequest {
    #[serde(default)]
    filter: TutorSearchFilter,
    #[serde(default)]
    query: Option<String>,
    /// Anchors the `availableToday` clause; defaults to the server's weekday.
    #[serde(default)]
    reference_day: Option<DayOfWeek>,
    #[serde(default)]
    origin: Option<GeoPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteRequest {
    tutor_id: TutorId,
    duration: SessionDuration,
}

async fn subjects_handler() -> Json<&'static [catalog::Subject]> {
    Json(catalog::subjects())
}

pub(crate) async fn search_handler<R, P, I>(
    State(service): State<Arc<MarketplaceService<R, P, I>>>,
    Json(payload): Json<SearchRequest>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    P: PaymentProcessor + 'static,
    I: IdentityProvider + 'static,
{
    let reference_day = payload
        .reference_day
        .unwrap_or_else(|| DayOfWeek::from(Local::now().weekday()));
    let mut context = SearchContext::on(reference_day);
    if let Some(origin) = payload.origin {
        context = context.with_origin(origin);
    }

    match service.search(&payload.filter, payload.query.as_deref(), &context) {
        Ok(tutors) => (StatusCode::OK, Json(tutors)).into_response(),
        Err(error) => internal_error(error),
    }
}

pub(crate) async fn quote_handler<R, P, I>(
    State(service): State<Arc<MarketplaceService<R, P, I>>>,
    Json(payload): Json<QuoteRequest>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    P: PaymentProcessor + 'static,
    I: IdentityProvider + 'static,
{
    match service.quote(&payload.tutor_id, payload.duration) {
        Ok(quote) => (StatusCode::OK, Json(quote)).into_response(),
        Err(BookingServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({ "error": "tutor not found" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(error) => internal_error(error),
    }
}

pub(crate) async fn book_handler<R, P, I>(
    State(service): State<Arc<MarketplaceService<R, P, I>>>,
    Json(request): Json<BookingRequest>,
) -> Response
where
    R: MarketplaceRepository + 'static,
    P: PaymentProcessor + 'static,
    I: IdentityProvider + 'static,
{
    match service.book(&request) {
        Ok(confirmation) if confirmation.payment.status == PaymentStatus::Failed => {
            (StatusCode::PAYMENT_REQUIRED, Json(confirmation)).into_response()
        }
        Ok(confirmation) => (StatusCode::CREATED, Json(confirmation)).into_response(),
        Err(BookingServiceError::Unauthenticated)
        | Err(BookingServiceError::StudentRoleRequired) => {
            let payload = json!({ "error": "booking requires a signed-in student" });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        }
        Err(BookingServiceError::Booking(BookingError::Conflict { existing })) => {
            let payload = json!({
                "error": "requested window is already booked",
                "conflictingSessionId": existing.0,
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        Err(BookingServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({ "error": "requested window is already booked" });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        Err(error @ BookingServiceError::Booking(BookingError::NotAvailable { .. }))
        | Err(error @ BookingServiceError::Availability(_)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(BookingServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({ "error": "tutor not found" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(error) => internal_error(error),
    }
}

fn internal_error(error: BookingServiceError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
