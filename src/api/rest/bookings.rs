use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::engine::bookings::{self, BookingPatch, NewBooking};
use crate::engine::lifecycle::Operation;
use crate::engine::views::{booking_view, booking_views};
use crate::error::AppError;
use crate::models::booking::BookingView;
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/my", get(my_bookings))
        .route("/bookings/driver", get(driver_bookings))
        .route(
            "/bookings/:id",
            get(get_booking).put(update_booking).delete(delete_booking),
        )
        .route("/bookings/:id/confirm", put(confirm_booking))
        .route("/bookings/:id/confirm-driver", put(driver_accept))
        .route("/bookings/:id/start", put(start_trip))
        .route("/bookings/:id/complete", put(complete_trip))
}

#[derive(Deserialize)]
pub struct ConfirmRequest {
    pub vehicle_id: Uuid,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Json(payload): Json<NewBooking>,
) -> Result<(StatusCode, Json<BookingView>), AppError> {
    let booking = bookings::create_booking(&state, &caller, payload)?;
    Ok((StatusCode::CREATED, Json(booking_view(&state, booking))))
}

async fn my_bookings(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<Vec<BookingView>>, AppError> {
    caller.require(Role::Rider)?;
    let list = bookings::rider_bookings(&state, caller.id);
    Ok(Json(booking_views(&state, list)))
}

async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmRequest>,
) -> Result<Json<BookingView>, AppError> {
    let booking = bookings::confirm_booking(&state, &caller, id, payload.vehicle_id)?;
    Ok(Json(booking_view(&state, booking)))
}

async fn driver_bookings(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<Vec<BookingView>>, AppError> {
    caller.require(Role::Driver)?;
    let list = bookings::driver_bookings(&state, caller.id);
    Ok(Json(booking_views(&state, list)))
}

async fn driver_accept(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    let booking = bookings::driver_transition(&state, &caller, id, Operation::DriverAccept)?;
    Ok(Json(booking_view(&state, booking)))
}

async fn start_trip(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    let booking = bookings::driver_transition(&state, &caller, id, Operation::StartTrip)?;
    Ok(Json(booking_view(&state, booking)))
}

async fn complete_trip(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    let booking = bookings::driver_transition(&state, &caller, id, Operation::CompleteTrip)?;
    Ok(Json(booking_view(&state, booking)))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<Vec<BookingView>>, AppError> {
    caller.require(Role::Admin)?;
    Ok(Json(booking_views(&state, bookings::all_bookings(&state))))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, AppError> {
    caller.require(Role::Admin)?;

    let booking = state
        .bookings
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("booking {id} not found")))?;

    Ok(Json(booking_view(&state, booking)))
}

async fn update_booking(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<BookingPatch>,
) -> Result<Json<BookingView>, AppError> {
    let booking = bookings::admin_update(&state, &caller, id, patch)?;
    Ok(Json(booking_view(&state, booking)))
}

async fn delete_booking(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking = bookings::admin_delete(&state, &caller, id)?;
    Ok(Json(json!({ "deleted": booking.id })))
}
