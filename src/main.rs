use devcamper::config::AppConfig;
use devcamper::{db, routes, services};

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env();

    // Initialize database
    let db = db::init_db(&config)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    db::ensure_indexes(&db)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let geocoder = services::geocoder_from_config(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    log::info!("🚀 Starting server at {}:{}", config.host, config.port);
    log::info!("📁 Photo uploads in {}", config.file_upload_path.display());
    log::info!("🔒 CORS allowed origins: {:?}", config.cors_origins);

    let host = config.host.clone();
    let port = config.port;
    let geocoder = web::Data::from(geocoder);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        for origin in &config.cors_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .app_data(web::Data::new(db.clone()))
            .app_data(config.clone())
            .app_data(geocoder.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
