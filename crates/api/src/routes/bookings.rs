//! Booking routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tutora_core::booking::{Booking, BookingType, Party};
use tutora_core::engine::CreateBooking;
use tutora_shared::Role;
use tutora_shared::types::{BookingId, PageRequest, PageResponse, SubjectOfferingId, TeacherId};
use validator::{Validate, ValidationError};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::AppState;
use super::validated;

/// Creates the booking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/{booking_id}", get(get_booking))
        .route("/bookings/{booking_id}/confirm", post(confirm_booking))
        .route("/bookings/{booking_id}/cancel", post(cancel_booking))
        .route("/teachers/{teacher_id}/bookings", get(list_bookings))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for booking a lesson.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_lesson_window"))]
pub struct CreateBookingRequest {
    /// Teacher to book.
    pub teacher_id: TeacherId,
    /// Offering the lesson is for.
    pub subject_offering_id: SubjectOfferingId,
    /// Lesson start (UTC).
    pub start_at: DateTime<Utc>,
    /// Lesson end (UTC).
    pub end_at: DateTime<Utc>,
    /// Kind of lesson, single by default.
    #[serde(default)]
    pub booking_type: Option<BookingType>,
}

fn validate_lesson_window(request: &CreateBookingRequest) -> Result<(), ValidationError> {
    if request.start_at < request.end_at {
        Ok(())
    } else {
        Err(ValidationError::new("end_at must be after start_at"))
    }
}

/// Request body for cancelling a booking.
#[derive(Debug, Deserialize, Validate)]
pub struct CancelBookingRequest {
    /// Why the booking is cancelled.
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/bookings` - Students book a lesson.
async fn create_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let student_id = auth.student_id()?;
    let payload = validated(payload)?;

    let booking = state
        .engines
        .bookings
        .create_booking(
            CreateBooking {
                teacher_id: payload.teacher_id,
                student_id,
                subject_offering_id: payload.subject_offering_id,
                start_at: payload.start_at,
                end_at: payload.end_at,
                booking_type: payload.booking_type.unwrap_or(BookingType::Single),
            },
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET `/bookings/{booking_id}`
async fn get_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(booking_id): Path<BookingId>,
) -> ApiResult<Json<Booking>> {
    let booking = state.engines.bookings.get_booking(booking_id).await?;
    acting_party(&auth, &booking)?;
    Ok(Json(booking))
}

/// POST `/bookings/{booking_id}/confirm` - The teacher accepts a request.
async fn confirm_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(booking_id): Path<BookingId>,
) -> ApiResult<Json<Booking>> {
    let booking = state.engines.bookings.get_booking(booking_id).await?;
    auth.require_teacher_or_admin(booking.teacher_id)?;

    let booking = state
        .engines
        .bookings
        .confirm_booking(booking_id, Utc::now())
        .await?;
    Ok(Json(booking))
}

/// POST `/bookings/{booking_id}/cancel`
async fn cancel_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(booking_id): Path<BookingId>,
    Json(payload): Json<CancelBookingRequest>,
) -> ApiResult<Json<Booking>> {
    let payload = validated(payload)?;
    let booking = state.engines.bookings.get_booking(booking_id).await?;
    let party = acting_party(&auth, &booking)?;

    let booking = state
        .engines
        .bookings
        .cancel_booking(booking_id, &payload.reason, party, Utc::now())
        .await?;
    Ok(Json(booking))
}

/// GET `/teachers/{teacher_id}/bookings`
async fn list_bookings(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(teacher_id): Path<TeacherId>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<Booking>>> {
    auth.require_teacher_or_admin(teacher_id)?;
    let page = state
        .engines
        .bookings
        .list_bookings(teacher_id, page)
        .await?;
    Ok(Json(page))
}

/// Which side of `booking` the caller is on; admins act as the system.
fn acting_party(auth: &AuthUser, booking: &Booking) -> ApiResult<Party> {
    match auth.role() {
        Role::Admin => Ok(Party::System),
        Role::Teacher if auth.is_teacher(booking.teacher_id) => Ok(Party::Teacher),
        Role::Student if auth.is_student(booking.student_id) => Ok(Party::Student),
        _ => Err(ApiError::forbidden("Not a party to this booking")),
    }
}
