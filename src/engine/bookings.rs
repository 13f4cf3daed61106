//! Booking operations driven by the lifecycle table.
//!
//! Each operation holds the booking's map entry for its whole
//! read-check-write, and applies any vehicle side effect before releasing it,
//! so a booking's status and its vehicle's availability change together.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::engine::lifecycle::{self, Operation, SideEffect};
use crate::engine::pricing::{creation_price, trip_price};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::booking::{Booking, BookingEvent, BookingStatus};
use crate::models::user::Role;
use crate::models::vehicle::VehicleType;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    #[serde(default)]
    pub pickup_location: String,
    #[serde(default)]
    pub drop_location: String,
    pub pickup_point: Option<GeoPoint>,
    pub drop_point: Option<GeoPoint>,
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub duration_minutes: f64,
    pub vehicle_type: Option<VehicleType>,
    pub vehicle_id: Option<Uuid>,
    pub total_price: Option<f64>,
    pub scheduled_date: Option<DateTime<Utc>>,
}

/// Fields an administrator may overwrite. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingPatch {
    pub vehicle: Option<Uuid>,
    pub vehicle_type: Option<VehicleType>,
    pub pickup_location: Option<String>,
    pub drop_location: Option<String>,
    pub pickup_point: Option<GeoPoint>,
    pub drop_point: Option<GeoPoint>,
    pub distance_km: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub total_price: Option<f64>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub status: Option<BookingStatus>,
}

pub fn create_booking(
    state: &AppState,
    caller: &AuthUser,
    request: NewBooking,
) -> Result<Booking, AppError> {
    let start = Instant::now();
    let result = insert_new_booking(state, caller, request);
    record(state, "create", start, &result);

    if let Ok(booking) = &result {
        state.metrics.bookings_created_total.inc();
        info!(
            booking_id = %booking.id,
            rider_id = %caller.id,
            status = %booking.status,
            total_price = booking.total_price,
            "booking created"
        );
    }

    result
}

fn insert_new_booking(
    state: &AppState,
    caller: &AuthUser,
    request: NewBooking,
) -> Result<Booking, AppError> {
    let status = lifecycle::initial_status(caller.role, request.vehicle_id.is_some())?;

    validate_new_booking(&request)?;

    let mut vehicle_type = request.vehicle_type;
    let mut rate = None;
    if let Some(vehicle_id) = request.vehicle_id {
        let vehicle = state
            .vehicles
            .get(&vehicle_id)
            .filter(|vehicle| vehicle.is_approved())
            .ok_or(AppError::VehicleNotAvailable)?;
        vehicle_type = Some(vehicle.vehicle_type);
        rate = Some(vehicle.price_per_km);
    }

    let total_price = creation_price(request.total_price, request.distance_km, rate)
        .ok_or_else(price_out_of_range)?;

    let now = Utc::now();
    let booking = Booking {
        id: Uuid::new_v4(),
        user: caller.id,
        vehicle: request.vehicle_id,
        vehicle_type,
        pickup_location: request.pickup_location.trim().to_string(),
        drop_location: request.drop_location.trim().to_string(),
        pickup_point: request.pickup_point,
        drop_point: request.drop_point,
        distance_km: request.distance_km,
        duration_minutes: request.duration_minutes,
        total_price,
        scheduled_date: request.scheduled_date,
        status,
        created_at: now,
        updated_at: now,
    };

    state.bookings.insert(booking.id, booking.clone());
    state.publish(BookingEvent::new(&booking, "create"));
    Ok(booking)
}

fn price_out_of_range() -> AppError {
    AppError::BadRequest("trip price is out of range".to_string())
}

fn validate_new_booking(request: &NewBooking) -> Result<(), AppError> {
    if request.pickup_location.trim().is_empty() {
        return Err(AppError::BadRequest(
            "pickup_location is required".to_string(),
        ));
    }
    if request.drop_location.trim().is_empty() {
        return Err(AppError::BadRequest("drop_location is required".to_string()));
    }
    if !request.distance_km.is_finite() || request.distance_km < 0.0 {
        return Err(AppError::BadRequest(
            "distance_km must be a non-negative number".to_string(),
        ));
    }
    if !request.duration_minutes.is_finite() || request.duration_minutes < 0.0 {
        return Err(AppError::BadRequest(
            "duration_minutes must be a non-negative number".to_string(),
        ));
    }
    if let Some(price) = request.total_price {
        if !price.is_finite() || price < 0.0 {
            return Err(AppError::BadRequest(
                "total_price must be a non-negative number".to_string(),
            ));
        }
    }
    for point in [&request.pickup_point, &request.drop_point].into_iter().flatten() {
        if !point.is_valid() {
            return Err(AppError::BadRequest("invalid coordinates".to_string()));
        }
    }

    Ok(())
}

/// Rider binds an approved vehicle to their `requested` booking.
pub fn confirm_booking(
    state: &AppState,
    caller: &AuthUser,
    booking_id: Uuid,
    vehicle_id: Uuid,
) -> Result<Booking, AppError> {
    let start = Instant::now();
    let result = apply_confirm(state, caller, booking_id, vehicle_id);
    finish(state, Operation::Confirm, caller, booking_id, start, result)
}

fn apply_confirm(
    state: &AppState,
    caller: &AuthUser,
    booking_id: Uuid,
    vehicle_id: Uuid,
) -> Result<Booking, AppError> {
    lifecycle::authorize(Operation::Confirm, caller.role)?;

    let mut booking = state
        .bookings
        .get_mut(&booking_id)
        .filter(|booking| booking.user == caller.id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

    let transition = lifecycle::next(booking.status, Operation::Confirm, caller.role)?;

    if transition.effect == Some(SideEffect::BindVehicle) {
        let vehicle = state
            .vehicles
            .get(&vehicle_id)
            .filter(|vehicle| vehicle.is_approved())
            .ok_or(AppError::VehicleNotAvailable)?;
        let total_price = trip_price(booking.distance_km, vehicle.price_per_km)
            .ok_or_else(price_out_of_range)?;

        booking.vehicle = Some(vehicle.id);
        booking.vehicle_type = Some(vehicle.vehicle_type);
        booking.total_price = total_price;
    }

    booking.status = transition.to;
    booking.updated_at = Utc::now();
    Ok(booking.clone())
}

/// Driver-side transitions: accept, start and complete.
pub fn driver_transition(
    state: &AppState,
    caller: &AuthUser,
    booking_id: Uuid,
    operation: Operation,
) -> Result<Booking, AppError> {
    let start = Instant::now();
    let result = apply_driver_transition(state, caller, booking_id, operation);
    let touches_vehicle = matches!(operation, Operation::StartTrip | Operation::CompleteTrip);

    let result = finish(state, operation, caller, booking_id, start, result);
    if touches_vehicle && result.is_ok() {
        state.refresh_available_vehicles();
    }
    result
}

fn apply_driver_transition(
    state: &AppState,
    caller: &AuthUser,
    booking_id: Uuid,
    operation: Operation,
) -> Result<Booking, AppError> {
    lifecycle::authorize(operation, caller.role)?;

    let mut booking = state
        .bookings
        .get_mut(&booking_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

    let vehicle_id = booking
        .vehicle
        .ok_or_else(|| AppError::Forbidden("not your booking".to_string()))?;
    let mut vehicle = state
        .vehicles
        .get_mut(&vehicle_id)
        .ok_or_else(|| AppError::NotFound(format!("vehicle {vehicle_id} not found")))?;

    if vehicle.driver != caller.id {
        return Err(AppError::Forbidden("not your booking".to_string()));
    }

    let transition = lifecycle::next(booking.status, operation, caller.role)?;
    let now = Utc::now();

    if let Some(SideEffect::SetVehicleAvailability(available)) = transition.effect {
        vehicle.is_available = available;
        vehicle.updated_at = now;
    }

    booking.status = transition.to;
    booking.updated_at = now;
    Ok(booking.clone())
}

fn finish(
    state: &AppState,
    operation: Operation,
    caller: &AuthUser,
    booking_id: Uuid,
    start: Instant,
    result: Result<Booking, AppError>,
) -> Result<Booking, AppError> {
    record(state, operation.as_str(), start, &result);

    match &result {
        Ok(booking) => {
            state.publish(BookingEvent::new(booking, operation.as_str()));
            info!(
                booking_id = %booking.id,
                caller_id = %caller.id,
                operation = %operation,
                status = %booking.status,
                "booking transition applied"
            );
        }
        Err(err) => {
            warn!(
                booking_id = %booking_id,
                caller_id = %caller.id,
                operation = %operation,
                error = %err,
                "booking transition rejected"
            );
        }
    }

    result
}

fn record(state: &AppState, operation: &str, start: Instant, result: &Result<Booking, AppError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(AppError::NotFound(_)) => "not_found",
        Err(AppError::InvalidTransition(_)) => "invalid_transition",
        Err(AppError::Forbidden(_)) => "forbidden",
        Err(AppError::VehicleNotAvailable) => "vehicle_not_available",
        Err(_) => "error",
    };
    state
        .metrics
        .observe_transition(operation, outcome, start.elapsed().as_secs_f64());
}

/// Administrative overwrite. Bypasses the lifecycle table and leaves vehicle
/// availability untouched.
pub fn admin_update(
    state: &AppState,
    caller: &AuthUser,
    booking_id: Uuid,
    patch: BookingPatch,
) -> Result<Booking, AppError> {
    caller.require(Role::Admin)?;

    let updated = {
        let mut booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

        let previous = booking.status;
        apply_patch(&mut booking, patch);
        booking.updated_at = Utc::now();

        if previous != booking.status {
            warn!(
                booking_id = %booking_id,
                from = %previous,
                to = %booking.status,
                "booking status overwritten by admin"
            );
        }
        booking.clone()
    };

    state.publish(BookingEvent::new(&updated, "admin-update"));
    Ok(updated)
}

fn apply_patch(booking: &mut Booking, patch: BookingPatch) {
    if let Some(vehicle) = patch.vehicle {
        booking.vehicle = Some(vehicle);
    }
    if let Some(vehicle_type) = patch.vehicle_type {
        booking.vehicle_type = Some(vehicle_type);
    }
    if let Some(pickup_location) = patch.pickup_location {
        booking.pickup_location = pickup_location;
    }
    if let Some(drop_location) = patch.drop_location {
        booking.drop_location = drop_location;
    }
    if let Some(point) = patch.pickup_point {
        booking.pickup_point = Some(point);
    }
    if let Some(point) = patch.drop_point {
        booking.drop_point = Some(point);
    }
    if let Some(distance_km) = patch.distance_km {
        booking.distance_km = distance_km;
    }
    if let Some(duration_minutes) = patch.duration_minutes {
        booking.duration_minutes = duration_minutes;
    }
    if let Some(total_price) = patch.total_price {
        booking.total_price = total_price;
    }
    if let Some(scheduled_date) = patch.scheduled_date {
        booking.scheduled_date = Some(scheduled_date);
    }
    if let Some(status) = patch.status {
        booking.status = status;
    }
}

pub fn admin_delete(state: &AppState, caller: &AuthUser, booking_id: Uuid) -> Result<Booking, AppError> {
    caller.require(Role::Admin)?;

    let start = Instant::now();
    let result = state
        .bookings
        .remove(&booking_id)
        .map(|(_, booking)| booking)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")));
    record(state, "admin-delete", start, &result);

    let booking = result?;
    state.publish(BookingEvent::new(&booking, "admin-delete"));
    info!(booking_id = %booking_id, "booking deleted by admin");
    Ok(booking)
}

fn newest_first(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    bookings
}

pub fn rider_bookings(state: &AppState, rider_id: Uuid) -> Vec<Booking> {
    newest_first(
        state
            .bookings
            .iter()
            .filter(|entry| entry.value().user == rider_id)
            .map(|entry| entry.value().clone())
            .collect(),
    )
}

pub fn driver_bookings(state: &AppState, driver_id: Uuid) -> Vec<Booking> {
    let owned: Vec<Uuid> = state
        .vehicles
        .iter()
        .filter(|entry| entry.value().driver == driver_id)
        .map(|entry| *entry.key())
        .collect();

    newest_first(
        state
            .bookings
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .vehicle
                    .is_some_and(|vehicle| owned.contains(&vehicle))
            })
            .map(|entry| entry.value().clone())
            .collect(),
    )
}

pub fn all_bookings(state: &AppState) -> Vec<Booking> {
    newest_first(
        state
            .bookings
            .iter()
            .map(|entry| entry.value().clone())
            .collect(),
    )
}
