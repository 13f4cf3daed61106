use uuid::Uuid;

use crate::models::booking::{Booking, BookingView};
use crate::models::user::UserSummary;
use crate::models::vehicle::{Vehicle, VehicleSummary, VehicleView};
use crate::state::AppState;

// Callers must not hold a guard on `users` or `vehicles`.

fn user_summary(state: &AppState, id: Uuid) -> Option<UserSummary> {
    state.users.get(&id).map(|user| UserSummary::from(user.value()))
}

fn vehicle_summary(state: &AppState, id: Uuid) -> Option<VehicleSummary> {
    let vehicle = state.vehicles.get(&id)?.value().clone();

    Some(VehicleSummary {
        id: vehicle.id,
        name: vehicle.name,
        vehicle_type: vehicle.vehicle_type,
        number_plate: vehicle.number_plate,
        price_per_km: vehicle.price_per_km,
        driver_details: user_summary(state, vehicle.driver),
    })
}

pub fn booking_view(state: &AppState, booking: Booking) -> BookingView {
    BookingView {
        user_details: user_summary(state, booking.user),
        vehicle_details: booking.vehicle.and_then(|id| vehicle_summary(state, id)),
        booking,
    }
}

pub fn booking_views(state: &AppState, bookings: Vec<Booking>) -> Vec<BookingView> {
    bookings
        .into_iter()
        .map(|booking| booking_view(state, booking))
        .collect()
}

pub fn vehicle_views(state: &AppState, vehicles: Vec<Vehicle>) -> Vec<VehicleView> {
    vehicles
        .into_iter()
        .map(|vehicle| VehicleView {
            driver_details: user_summary(state, vehicle.driver),
            vehicle,
        })
        .collect()
}
