use std::time::Duration;

use actix_web::{web, HttpResponse};
use mongodb::{bson::doc, Database};
use serde_json::json;

const SERVICE: &str = "devcamper-api";
const READINESS_TIMEOUT: Duration = Duration::from_secs(2);

/// Liveness; never touches the database
/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": SERVICE,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Readiness: 503 until MongoDB answers a ping
/// GET /health/ready
pub async fn readiness(db: web::Data<Database>) -> HttpResponse {
    let ping = tokio::time::timeout(READINESS_TIMEOUT, async {
        db.run_command(doc! { "ping": 1 }).await
    })
    .await;

    match ping {
        Ok(Ok(_)) => HttpResponse::Ok().json(json!({
            "status": "ready",
            "service": SERVICE,
            "database": "connected",
        })),
        Ok(Err(e)) => {
            log::warn!("Readiness ping failed: {}", e);
            not_ready()
        }
        Err(_) => {
            log::warn!("Readiness ping timed out after {:?}", READINESS_TIMEOUT);
            not_ready()
        }
    }
}

fn not_ready() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(json!({
        "status": "unavailable",
        "service": SERVICE,
        "database": "unreachable",
    }))
}
