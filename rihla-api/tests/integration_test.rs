use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, NaiveTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use rihla_api::middleware::auth::OperatorClaims;
use rihla_api::state::{AppState, AuthConfig};
use rihla_api::app;
use rihla_store::MemoryStore;
use rihla_transit::models::{AssemblyPoint, Bus, Route};
use rihla_transit::repository::{CreateTripOutcome, NewTrip, TripRepository};

const TEST_SECRET: &str = "test-secret";

struct Harness {
    state: AppState,
    office_id: Uuid,
    trip_id: Uuid,
}

impl Harness {
    /// Store seeded with one office, a 10-seat bus, one route and one trip
    /// three days out at 4000 per seat.
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let office_id = Uuid::new_v4();

        let origin = AssemblyPoint {
            id: Uuid::new_v4(),
            name: "Souq Shabi".to_string(),
            city: "Khartoum".to_string(),
        };
        let destination = AssemblyPoint {
            id: Uuid::new_v4(),
            name: "Central Station".to_string(),
            city: "Atbara".to_string(),
        };
        store.create_assembly_point(&origin).await.unwrap();
        store.create_assembly_point(&destination).await.unwrap();

        let bus = Bus {
            id: Uuid::new_v4(),
            office_id,
            plate_number: "KH-5511".to_string(),
            capacity: 10,
            active: true,
            created_at: Utc::now(),
        };
        store.create_bus(&bus).await.unwrap();

        let route = Route {
            id: Uuid::new_v4(),
            office_id,
            origin_id: origin.id,
            destination_id: destination.id,
            base_price: 4000,
            duration_minutes: 360,
            created_at: Utc::now(),
        };
        store.create_route(&route).await.unwrap();

        let outcome = store
            .create_trip(NewTrip {
                office_id,
                route_id: route.id,
                bus_id: bus.id,
                departure_date: (Utc::now() + Duration::days(3)).date_naive(),
                departure_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                price: None,
            })
            .await
            .unwrap();
        let trip_id = match outcome {
            CreateTripOutcome::Created(trip) => trip.id,
            other => panic!("seed trip failed: {:?}", other),
        };

        let state = AppState::build(
            store,
            AuthConfig {
                secret: TEST_SECRET.to_string(),
                expiration: 3600,
            },
        );

        Self {
            state,
            office_id,
            trip_id,
        }
    }

    fn token_for(&self, office_id: Uuid) -> String {
        let claims = OperatorClaims {
            sub: "operator-1".to_string(),
            office_id,
            role: "OPERATOR".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn token(&self) -> String {
        self.token_for(self.office_id)
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app(self.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn book_seats(&self, seats: &[&str]) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/v1/bookings",
            None,
            Some(json!({
                "trip_id": self.trip_id,
                "seat_numbers": seats,
                "passenger_name": "Amina Hassan",
                "passenger_phone": "0912345678",
            })),
        )
        .await
    }
}

#[tokio::test]
async fn test_booking_payment_confirmation_flow() {
    let h = Harness::new().await;

    // 1. Trip is listed with full availability
    let (status, body) = h.request("GET", "/v1/trips", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["available_seats"], 10);

    // 2. Book two seats
    let (status, booking) = h.book_seats(&["A1", "A2"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["status"], "PENDING");
    assert_eq!(booking["total_amount"], 8000);
    let booking_id = booking["id"].as_str().unwrap().to_string();

    // 3. Availability dropped
    let (_, body) = h.request("GET", "/v1/trips", None, None).await;
    assert_eq!(body[0]["available_seats"], 8);

    // 4. Mobile money settles immediately and confirms the booking
    let (status, payment) = h
        .request(
            "POST",
            &format!("/v1/bookings/{}/payments", booking_id),
            None,
            Some(json!({
                "method": "MOBILE_MONEY",
                "mobile_money_number": "0912345678",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "PAID");
    assert_eq!(payment["amount"], 8000);
    assert!(payment["transaction_id"].as_str().unwrap().starts_with("TXN-"));

    let (_, booking) = h
        .request("GET", &format!("/v1/bookings/{}", booking_id), None, None)
        .await;
    assert_eq!(booking["status"], "CONFIRMED");

    // 5. Operator completes the booking after the trip runs
    let (status, booking) = h
        .request(
            "POST",
            &format!("/v1/bookings/{}/status", booking_id),
            Some(&h.token()),
            Some(json!({ "status": "COMPLETED" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["status"], "COMPLETED");
}

#[tokio::test]
async fn test_seat_conflict_returns_409() {
    let h = Harness::new().await;

    let (status, _) = h.book_seats(&["A1"]).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h.book_seats(&["A1"]).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("A1"));
}

#[tokio::test]
async fn test_seat_count_limit_returns_400() {
    let h = Harness::new().await;

    let (status, _) = h
        .book_seats(&["A1", "A2", "A3", "A4", "B1", "B2"])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h.book_seats(&[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_seat_returns_404() {
    let h = Harness::new().await;

    let (status, body) = h.book_seats(&["Z9"]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Z9"));
}

#[tokio::test]
async fn test_operator_endpoints_require_token() {
    let h = Harness::new().await;

    let uri = format!("/v1/offices/{}/bookings", h.office_id);

    let (status, _) = h.request("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h.request("GET", &uri, Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h.request("GET", &uri, Some(&h.token()), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_foreign_office_is_forbidden() {
    let h = Harness::new().await;

    let (_, booking) = h.book_seats(&["A1"]).await;
    let booking_id = booking["id"].as_str().unwrap();

    let foreign_token = h.token_for(Uuid::new_v4());
    let (status, body) = h
        .request(
            "POST",
            &format!("/v1/bookings/{}/status", booking_id),
            Some(&foreign_token),
            Some(json!({ "status": "CONFIRMED" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    // Opaque denial: no office details in the body.
    assert_eq!(body["error"], "not authorized");
}

#[tokio::test]
async fn test_cancellation_releases_seats() {
    let h = Harness::new().await;

    let (_, booking) = h.book_seats(&["A1", "A2", "A3"]).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let (_, body) = h.request("GET", "/v1/trips", None, None).await;
    assert_eq!(body[0]["available_seats"], 7);

    let (status, booking) = h
        .request(
            "POST",
            &format!("/v1/bookings/{}/status", booking_id),
            Some(&h.token()),
            Some(json!({ "status": "CANCELLED" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["status"], "CANCELLED");

    let (_, body) = h.request("GET", "/v1/trips", None, None).await;
    assert_eq!(body[0]["available_seats"], 10);

    // Released seats are bookable again
    let (status, _) = h.book_seats(&["A1"]).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_offline_payment_settlement() {
    let h = Harness::new().await;

    let (_, booking) = h.book_seats(&["A1"]).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let (status, payment) = h
        .request(
            "POST",
            &format!("/v1/bookings/{}/payments", booking_id),
            None,
            Some(json!({ "method": "CASH_ON_ARRIVAL" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "PENDING");
    let payment_id = payment["id"].as_str().unwrap().to_string();

    // Booking stays Pending until the operator settles
    let (_, booking) = h
        .request("GET", &format!("/v1/bookings/{}", booking_id), None, None)
        .await;
    assert_eq!(booking["status"], "PENDING");

    let (status, payment) = h
        .request(
            "POST",
            &format!("/v1/payments/{}/settle", payment_id),
            Some(&h.token()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "PAID");

    let (_, booking) = h
        .request("GET", &format!("/v1/bookings/{}", booking_id), None, None)
        .await;
    assert_eq!(booking["status"], "CONFIRMED");
}

#[tokio::test]
async fn test_mobile_money_requires_number() {
    let h = Harness::new().await;

    let (_, booking) = h.book_seats(&["A1"]).await;
    let booking_id = booking["id"].as_str().unwrap();

    let (status, _) = h
        .request(
            "POST",
            &format!("/v1/bookings/{}/payments", booking_id),
            None,
            Some(json!({ "method": "MOBILE_MONEY" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_seat_layout_preview() {
    let h = Harness::new().await;

    let (status, layout) = h
        .request("GET", "/v1/seat-layout?capacity=45", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(layout["rows"], 12);
    assert_eq!(layout["columns"], 4);
    // Last row holds the single leftover seat
    assert_eq!(layout["grid"][11], json!(["L1"]));

    let (status, _) = h
        .request("GET", "/v1/seat-layout?capacity=0", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_trip_cancel_blocks_new_bookings() {
    let h = Harness::new().await;

    let (status, trip) = h
        .request(
            "POST",
            &format!("/v1/trips/{}/cancel", h.trip_id),
            Some(&h.token()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trip["cancelled"], true);

    let (status, _) = h.book_seats(&["A1"]).await;
    assert_eq!(status, StatusCode::GONE);
}

#[tokio::test]
async fn test_admin_creates_fleet_and_trip() {
    let h = Harness::new().await;
    let token = h.token();

    let (status, origin) = h
        .request(
            "POST",
            "/v1/admin/assembly-points",
            Some(&token),
            Some(json!({ "name": "Main Gate", "city": "Port Sudan" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, destination) = h
        .request(
            "POST",
            "/v1/admin/assembly-points",
            Some(&token),
            Some(json!({ "name": "North Stop", "city": "Kassala" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, bus) = h
        .request(
            "POST",
            "/v1/admin/buses",
            Some(&token),
            Some(json!({ "plate_number": "PS-2201", "capacity": 45 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Capacity beyond the layout maximum is rejected up front
    let (status, _) = h
        .request(
            "POST",
            "/v1/admin/buses",
            Some(&token),
            Some(json!({ "plate_number": "PS-9999", "capacity": 200 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, route) = h
        .request(
            "POST",
            "/v1/admin/routes",
            Some(&token),
            Some(json!({
                "origin_id": origin["id"],
                "destination_id": destination["id"],
                "base_price": 6000,
                "duration_minutes": 480,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let departure = (Utc::now() + Duration::days(5)).date_naive();
    let (status, trip) = h
        .request(
            "POST",
            "/v1/trips",
            Some(&token),
            Some(json!({
                "route_id": route["id"],
                "bus_id": bus["id"],
                "departure_date": departure,
                "departure_time": "09:30:00",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trip["price"], 6000);
    assert_eq!(trip["total_seats"], 45);
    assert_eq!(trip["available_seats"], 45);
}
