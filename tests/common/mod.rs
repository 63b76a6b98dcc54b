// Common test utilities for API integration tests
#![allow(dead_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devcamper::config::AppConfig;
use devcamper::models::Role;
use devcamper::services::{GeocodeError, GeocodeResult, Geocoder};
use devcamper::utils::create_token;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

pub const TEST_SECRET: &str = "integration-secret";

/// Get MongoDB URL from environment or use default
pub fn get_mongodb_url() -> String {
    env::var("MONGODB_URI").unwrap_or_else(|_| {
        let port = env::var("MONGODB_PORT").unwrap_or_else(|_| "27017".to_string());
        format!("mongodb://localhost:{}", port)
    })
}

/// Handle to an unreachable server; for requests rejected before any query
pub async fn offline_db() -> Database {
    Client::with_uri_str("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=500")
        .await
        .expect("valid connection string")
        .database("devcamper_offline")
}

/// Fresh, indexed database on the test server, or `None` when MongoDB is not running
pub async fn test_db() -> Option<Database> {
    let mut options = ClientOptions::parse(get_mongodb_url()).await.ok()?;
    options.server_selection_timeout = Some(Duration::from_secs(2));
    let client = Client::with_options(options).ok()?;

    if let Err(e) = client.database("admin").run_command(doc! {"ping": 1}).await {
        println!("⚠️  MongoDB not available: {}", e);
        println!("   Skipping database-backed test");
        return None;
    }

    let db = client.database(&format!("devcamper_test_{}", ObjectId::new().to_hex()));
    devcamper::db::ensure_indexes(&db).await.ok()?;
    Some(db)
}

pub fn test_config(upload_dir: &std::path::Path) -> AppConfig {
    AppConfig {
        jwt_secret: TEST_SECRET.to_string(),
        max_file_upload: 1024,
        file_upload_path: upload_dir.to_path_buf(),
        ..AppConfig::default()
    }
}

pub fn bearer(user: &ObjectId, role: Role) -> (String, String) {
    let token = create_token(&user.to_hex(), role, TEST_SECRET, 3600).expect("token");
    ("Authorization".to_string(), format!("Bearer {}", token))
}

/// Known coordinates around Boston, MA
pub struct FixedGeocoder;

fn place(lng: f64, lat: f64, city: &str, zipcode: &str) -> GeocodeResult {
    GeocodeResult {
        latitude: lat,
        longitude: lng,
        formatted_address: format!("{}, MA {}", city, zipcode),
        street: String::new(),
        city: city.to_string(),
        state_code: "MA".to_string(),
        zipcode: zipcode.to_string(),
        country_code: "US".to_string(),
    }
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, GeocodeError> {
        let result = if address.contains("Boston") || address.contains("02215") {
            Some(place(-71.104028, 42.350846, "Boston", "02215"))
        } else if address.contains("Lowell") || address.contains("01852") {
            Some(place(-71.316171, 42.633425, "Lowell", "01852"))
        } else if address.contains("Burlington") || address.contains("05401") {
            Some(place(-73.212072, 44.475882, "Burlington", "05401"))
        } else {
            None
        };
        Ok(result.into_iter().collect())
    }
}

pub fn geocoder() -> Arc<dyn Geocoder> {
    Arc::new(FixedGeocoder)
}

/// Build the full API around a database handle and config
#[macro_export]
macro_rules! test_app {
    ($db:expr, $config:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(actix_web::web::Data::new($config.clone()))
                .app_data(actix_web::web::Data::from(common::geocoder()))
                .configure(devcamper::routes::configure),
        )
        .await
    };
}

pub fn bootcamp_payload(name: &str, address: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "description": "Full stack web development with a focus on JavaScript",
        "website": "https://devworks.com",
        "email": "enroll@devworks.com",
        "address": address,
        "careers": ["Web Development", "UI/UX"],
        "housing": true,
    })
}

pub fn course_payload(title: &str, tuition: f64) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "Learn the full stack",
        "weeks": 12,
        "tuition": tuition,
        "minimum_skill": "beginner",
    })
}

/// Multipart body with a single `file` field
pub fn multipart_file(filename: &str, content_type: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "----devcamper-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (format!("multipart/form-data; boundary={}", boundary), body)
}
