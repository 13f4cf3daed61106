use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::token::TokenKeys;
use crate::error::AppError;
use crate::models::booking::{Booking, BookingEvent};
use crate::models::user::User;
use crate::models::vehicle::{normalize_plate, Vehicle};
use crate::observability::metrics::Metrics;

/// In-memory document store plus shared services.
///
/// Lock order when more than one collection is touched: `bookings` before
/// `vehicles`. Guards are never held across an `.await`.
pub struct AppState {
    pub users: DashMap<Uuid, User>,
    pub vehicles: DashMap<Uuid, Vehicle>,
    pub bookings: DashMap<Uuid, Booking>,
    user_emails: DashMap<String, Uuid>,
    vehicle_plates: DashMap<String, Uuid>,
    pub booking_events_tx: broadcast::Sender<BookingEvent>,
    pub tokens: TokenKeys,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(tokens: TokenKeys, event_buffer_size: usize) -> Self {
        let (booking_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            users: DashMap::new(),
            vehicles: DashMap::new(),
            bookings: DashMap::new(),
            user_emails: DashMap::new(),
            vehicle_plates: DashMap::new(),
            booking_events_tx,
            tokens,
            metrics: Metrics::new(),
        }
    }

    /// Inserts a user, enforcing unique emails. The email must already be normalized.
    pub fn insert_user(&self, user: User) -> Result<(), AppError> {
        match self.user_emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Duplicate(format!(
                "email {} already registered",
                user.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user);
                Ok(())
            }
        }
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let id = *self.user_emails.get(email)?;
        self.users.get(&id).map(|user| user.value().clone())
    }

    pub fn remove_user(&self, id: Uuid) -> Option<User> {
        let (_, user) = self.users.remove(&id)?;
        self.user_emails.remove(&user.email);
        Some(user)
    }

    /// Inserts a vehicle, enforcing unique registration plates.
    pub fn insert_vehicle(&self, vehicle: Vehicle) -> Result<(), AppError> {
        match self.vehicle_plates.entry(normalize_plate(&vehicle.number_plate)) {
            Entry::Occupied(_) => Err(AppError::Duplicate(format!(
                "number plate {} already registered",
                vehicle.number_plate
            ))),
            Entry::Vacant(slot) => {
                slot.insert(vehicle.id);
                self.vehicles.insert(vehicle.id, vehicle);
                self.refresh_available_vehicles();
                Ok(())
            }
        }
    }

    pub fn remove_vehicle(&self, id: Uuid) -> Option<Vehicle> {
        let (_, vehicle) = self.vehicles.remove(&id)?;
        self.vehicle_plates.remove(&normalize_plate(&vehicle.number_plate));
        self.refresh_available_vehicles();
        Some(vehicle)
    }

    pub fn publish(&self, event: BookingEvent) {
        let _ = self.booking_events_tx.send(event);
    }

    pub fn refresh_available_vehicles(&self) {
        let available = self
            .vehicles
            .iter()
            .filter(|entry| entry.value().is_bookable())
            .count();
        self.metrics.vehicles_available.set(available as i64);
    }
}
