use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::user::UserSummary;
use crate::models::vehicle::{VehicleSummary, VehicleType};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Requested,
    Confirmed,
    DriverAssigned,
    TripStarted,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "requested",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::DriverAssigned => "driver_assigned",
            BookingStatus::TripStarted => "trip_started",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user: Uuid,
    pub vehicle: Option<Uuid>,
    pub vehicle_type: Option<VehicleType>,
    pub pickup_location: String,
    pub drop_location: String,
    pub pickup_point: Option<GeoPoint>,
    pub drop_point: Option<GeoPoint>,
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub total_price: f64,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booking with the rider's and the bound vehicle's details filled in.
/// Missing references (deleted user or vehicle) come back as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub user_details: Option<UserSummary>,
    pub vehicle_details: Option<VehicleSummary>,
}

/// Pushed to `/ws` subscribers whenever a booking changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    pub booking_id: Uuid,
    pub operation: String,
    pub status: BookingStatus,
    pub vehicle: Option<Uuid>,
    pub at: DateTime<Utc>,
}

impl BookingEvent {
    pub fn new(booking: &Booking, operation: &str) -> Self {
        Self {
            booking_id: booking.id,
            operation: operation.to_string(),
            status: booking.status,
            vehicle: booking.vehicle,
            at: Utc::now(),
        }
    }
}
