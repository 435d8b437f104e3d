//! Stand-in authority and backend services for running the gateway locally.
//!
//! Starts the authority on 8001 and the patients, doctors and records
//! services on 8002-8004. Log in with `POST /auth/login` through the gateway
//! and present the returned token as `Authorization: Bearer <token>`.

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;

const DEMO_TOKEN: &str = "demo-token";

fn authority() -> Router {
    Router::new()
        .route("/", get(|| async { Json(json!({"service": "auth", "status": "ok"})) }))
        .route(
            "/login",
            post(|| async { Json(json!({"access_token": DEMO_TOKEN, "token_type": "bearer"})) }),
        )
        .route("/verify-token", post(verify))
}

async fn verify(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(DEMO_TOKEN) => (
            StatusCode::OK,
            Json(json!({"subject": "demo@clinic.test", "role": "doctor"})),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Could not validate credentials"})),
        ),
    }
}

fn records_service(name: &'static str) -> Router {
    Router::new()
        .route(
            "/",
            get(move || async move { Json(json!({"service": name, "status": "ok"})) }).post(
                move |Json(body): Json<Value>| async move {
                    (StatusCode::CREATED, Json(json!({"service": name, "created": body})))
                },
            ),
        )
        .route(
            "/{id}",
            get(move |Path(id): Path<String>| async move {
                if id == "404" {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"detail": format!("{} record not found", name)})),
                    )
                } else {
                    (StatusCode::OK, Json(json!({"service": name, "id": id})))
                }
            })
            .delete(|| async { StatusCode::NO_CONTENT }),
        )
}

async fn serve(port: u16, app: Router) {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("Mock service listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

#[tokio::main]
async fn main() {
    tokio::join!(
        serve(8001, authority()),
        serve(8002, records_service("patients")),
        serve(8003, records_service("doctors")),
        serve(8004, records_service("records")),
    );
}
