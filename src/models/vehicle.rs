use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::user::UserSummary;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VehicleType {
    #[serde(rename = "bike")]
    Bike,
    #[serde(rename = "car")]
    Car,
    #[serde(rename = "van")]
    Van,
    #[serde(rename = "minibus")]
    Minibus,
    #[serde(rename = "bus_30")]
    Bus30,
    #[serde(rename = "bus_50")]
    Bus50,
}

impl VehicleType {
    pub fn default_seats(&self) -> u32 {
        match self {
            VehicleType::Bike => 1,
            VehicleType::Car => 4,
            VehicleType::Van => 7,
            VehicleType::Minibus => 15,
            VehicleType::Bus30 => 30,
            VehicleType::Bus50 => 50,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub driver: Uuid,
    pub vehicle_type: VehicleType,
    pub name: String,
    pub number_plate: String,
    pub seats: u32,
    pub price_per_km: f64,
    pub image: String,
    pub licence_url: String,
    pub status: ApprovalStatus,
    pub current_location: Option<GeoPoint>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn is_approved(&self) -> bool {
        self.status == ApprovalStatus::Approved
    }

    /// Approved and not currently on a trip.
    pub fn is_bookable(&self) -> bool {
        self.is_approved() && self.is_available
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSummary {
    pub id: Uuid,
    pub name: String,
    pub vehicle_type: VehicleType,
    pub number_plate: String,
    pub price_per_km: f64,
    pub driver_details: Option<UserSummary>,
}

/// A vehicle with its driver's contact details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleView {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub driver_details: Option<UserSummary>,
}

pub fn normalize_plate(plate: &str) -> String {
    plate
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}
