use std::cmp::Ordering;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, put};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::engine::views::vehicle_views;
use crate::error::AppError;
use crate::geo::{haversine_km, GeoPoint};
use crate::models::user::Role;
use crate::models::vehicle::{ApprovalStatus, Vehicle, VehicleType, VehicleView};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/vehicles/my", get(my_vehicles))
        .route("/vehicles/available", get(available_vehicles))
        .route("/vehicles/nearby", get(nearby_vehicles))
        .route("/vehicles/approve/:id", put(approve_vehicle))
        .route("/vehicles/reject/:id", put(reject_vehicle))
        .route("/vehicles/:id", delete(delete_vehicle))
        .route("/vehicles/:id/location", patch(update_vehicle_location))
}

#[derive(Deserialize)]
pub struct CreateVehicleRequest {
    pub vehicle_type: VehicleType,
    pub name: String,
    pub number_plate: String,
    pub seats: Option<u32>,
    pub price_per_km: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub licence_url: String,
    pub current_location: Option<GeoPoint>,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

#[derive(Deserialize)]
pub struct AvailableQuery {
    #[serde(rename = "type")]
    pub vehicle_type: Option<VehicleType>,
}

#[derive(Deserialize)]
pub struct NearbyQuery {
    #[serde(rename = "type")]
    pub vehicle_type: Option<VehicleType>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

async fn create_vehicle(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Json(payload): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    caller.require(Role::Driver)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    if payload.number_plate.trim().is_empty() {
        return Err(AppError::BadRequest(
            "number_plate cannot be empty".to_string(),
        ));
    }
    if !payload.price_per_km.is_finite() || payload.price_per_km <= 0.0 {
        return Err(AppError::BadRequest("price_per_km must be > 0".to_string()));
    }
    if payload.seats == Some(0) {
        return Err(AppError::BadRequest("seats must be > 0".to_string()));
    }
    if payload.current_location.is_some_and(|point| !point.is_valid()) {
        return Err(AppError::BadRequest("invalid coordinates".to_string()));
    }

    let now = Utc::now();
    let vehicle = Vehicle {
        id: Uuid::new_v4(),
        driver: caller.id,
        vehicle_type: payload.vehicle_type,
        name: payload.name.trim().to_string(),
        number_plate: payload.number_plate.trim().to_string(),
        seats: payload
            .seats
            .unwrap_or_else(|| payload.vehicle_type.default_seats()),
        price_per_km: payload.price_per_km,
        image: payload.image,
        licence_url: payload.licence_url,
        status: ApprovalStatus::Pending,
        current_location: payload.current_location,
        is_available: true,
        created_at: now,
        updated_at: now,
    };

    state.insert_vehicle(vehicle.clone())?;
    info!(vehicle_id = %vehicle.id, driver_id = %caller.id, "vehicle submitted for approval");

    Ok((StatusCode::CREATED, Json(vehicle)))
}

async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
) -> Json<Vec<VehicleView>> {
    let vehicles = state
        .vehicles
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(vehicle_views(&state, vehicles))
}

async fn my_vehicles(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Result<Json<Vec<VehicleView>>, AppError> {
    caller.require(Role::Driver)?;

    let vehicles = state
        .vehicles
        .iter()
        .filter(|entry| entry.value().driver == caller.id)
        .map(|entry| entry.value().clone())
        .collect();
    Ok(Json(vehicle_views(&state, vehicles)))
}

fn bookable(state: &AppState, vehicle_type: Option<VehicleType>) -> Vec<Vehicle> {
    state
        .vehicles
        .iter()
        .filter(|entry| {
            let vehicle = entry.value();
            vehicle.is_bookable() && vehicle_type.is_none_or(|wanted| vehicle.vehicle_type == wanted)
        })
        .map(|entry| entry.value().clone())
        .collect()
}

async fn available_vehicles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableQuery>,
) -> Json<Vec<VehicleView>> {
    Json(vehicle_views(&state, bookable(&state, query.vehicle_type)))
}

async fn nearby_vehicles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<VehicleView>>, AppError> {
    let mut vehicles = bookable(&state, query.vehicle_type);

    let origin = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "lat and lng must be given together".to_string(),
            ));
        }
    };

    if let Some(origin) = origin {
        if !origin.is_valid() {
            return Err(AppError::BadRequest("invalid coordinates".to_string()));
        }

        // Vehicles without a reported position sort last.
        let distance = |vehicle: &Vehicle| {
            vehicle
                .current_location
                .map(|point| haversine_km(&origin, &point))
                .unwrap_or(f64::INFINITY)
        };
        vehicles.sort_by(|a, b| {
            distance(a)
                .partial_cmp(&distance(b))
                .unwrap_or(Ordering::Equal)
        });
    }

    Ok(Json(vehicle_views(&state, vehicles)))
}

async fn update_vehicle_location(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Vehicle>, AppError> {
    caller.require(Role::Driver)?;

    if !payload.location.is_valid() {
        return Err(AppError::BadRequest("invalid coordinates".to_string()));
    }

    let mut vehicle = state
        .vehicles
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("vehicle {id} not found")))?;

    if vehicle.driver != caller.id {
        return Err(AppError::Forbidden("not your vehicle".to_string()));
    }

    vehicle.current_location = Some(payload.location);
    vehicle.updated_at = Utc::now();

    Ok(Json(vehicle.clone()))
}

fn set_approval(
    state: &AppState,
    caller: &AuthUser,
    id: Uuid,
    status: ApprovalStatus,
) -> Result<Vehicle, AppError> {
    caller.require(Role::Admin)?;

    let updated = {
        let mut vehicle = state
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("vehicle {id} not found")))?;
        vehicle.status = status;
        vehicle.updated_at = Utc::now();
        vehicle.clone()
    };

    state.refresh_available_vehicles();
    info!(vehicle_id = %id, status = ?status, "vehicle review recorded");
    Ok(updated)
}

async fn approve_vehicle(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, AppError> {
    set_approval(&state, &caller, id, ApprovalStatus::Approved).map(Json)
}

async fn reject_vehicle(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, AppError> {
    set_approval(&state, &caller, id, ApprovalStatus::Rejected).map(Json)
}

async fn delete_vehicle(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    caller.require(Role::Admin)?;

    let vehicle = state
        .remove_vehicle(id)
        .ok_or_else(|| AppError::NotFound(format!("vehicle {id} not found")))?;

    info!(vehicle_id = %vehicle.id, "vehicle deleted by admin");
    Ok(Json(json!({ "deleted": vehicle.id })))
}
