use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use rihla_transit::models::{AssemblyPoint, Bus, Route};
use rihla_transit::seatmap::generate_seat_layout;

use crate::error::AppError;
use crate::middleware::auth::OperatorClaims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAssemblyPointRequest {
    pub name: String,
    pub city: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateBusRequest {
    pub plate_number: String,
    pub capacity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateRouteRequest {
    pub origin_id: Uuid,
    pub destination_id: Uuid,
    pub base_price: i32,
    pub duration_minutes: i64,
}

/// POST /v1/admin/assembly-points
pub async fn create_assembly_point(
    State(state): State<AppState>,
    Json(req): Json<CreateAssemblyPointRequest>,
) -> Result<Json<AssemblyPoint>, AppError> {
    if req.name.trim().is_empty() || req.city.trim().is_empty() {
        return Err(AppError::BadRequest(
            "name and city are required".to_string(),
        ));
    }

    let point = AssemblyPoint {
        id: Uuid::new_v4(),
        name: req.name,
        city: req.city,
    };
    state
        .trips
        .create_assembly_point(&point)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(point))
}

/// POST /v1/admin/buses
/// Capacity is validated against the seat layout rules up front so a bus
/// that could never be laid out is rejected here, not at trip creation.
pub async fn create_bus(
    State(state): State<AppState>,
    Extension(claims): Extension<OperatorClaims>,
    Json(req): Json<CreateBusRequest>,
) -> Result<Json<Bus>, AppError> {
    if req.plate_number.trim().is_empty() {
        return Err(AppError::BadRequest("plate number is required".to_string()));
    }
    generate_seat_layout(req.capacity).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let bus = Bus {
        id: Uuid::new_v4(),
        office_id: claims.office_id,
        plate_number: req.plate_number,
        capacity: req.capacity as i32,
        active: true,
        created_at: Utc::now(),
    };
    state
        .trips
        .create_bus(&bus)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(bus))
}

/// POST /v1/admin/routes
pub async fn create_route(
    State(state): State<AppState>,
    Extension(claims): Extension<OperatorClaims>,
    Json(req): Json<CreateRouteRequest>,
) -> Result<Json<Route>, AppError> {
    if req.origin_id == req.destination_id {
        return Err(AppError::BadRequest(
            "origin and destination must differ".to_string(),
        ));
    }
    if req.base_price <= 0 {
        return Err(AppError::BadRequest(
            "base price must be positive".to_string(),
        ));
    }
    if req.duration_minutes <= 0 {
        return Err(AppError::BadRequest(
            "duration must be positive".to_string(),
        ));
    }

    let route = Route {
        id: Uuid::new_v4(),
        office_id: claims.office_id,
        origin_id: req.origin_id,
        destination_id: req.destination_id,
        base_price: req.base_price,
        duration_minutes: req.duration_minutes,
        created_at: Utc::now(),
    };
    state
        .trips
        .create_route(&route)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(route))
}
