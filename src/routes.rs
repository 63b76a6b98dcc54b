use actix_web::web;

use crate::error::ErrorResponse;
use crate::handlers;
use crate::middleware;

/// Register every route of the API; shared by the server and the tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ErrorResponse::bad_request(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ErrorResponse::bad_request(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ErrorResponse::bad_request(err.to_string()).into()),
    )
    .route("/health", web::get().to(handlers::health))
    .route("/health/ready", web::get().to(handlers::readiness))
    .service(
        web::scope("/api/v1")
            .wrap(middleware::AuthMiddleware)
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(handlers::register))
                    .route("/login", web::post().to(handlers::login))
                    .route("/me", web::get().to(handlers::me))
                    .route("/logout", web::get().to(handlers::logout)),
            )
            .service(
                web::scope("/bootcamps")
                    // Nested resources
                    .route("/{bootcamp_id}/courses", web::get().to(handlers::get_courses))
                    .route("/{bootcamp_id}/courses", web::post().to(handlers::add_course))
                    .route("/{bootcamp_id}/reviews", web::get().to(handlers::get_reviews))
                    .route("/{bootcamp_id}/reviews", web::post().to(handlers::add_review))
                    .route(
                        "/radius/{zipcode}/{distance}",
                        web::get().to(handlers::get_bootcamps_in_radius),
                    )
                    .route("/{id}/photo", web::put().to(handlers::bootcamp_photo_upload))
                    .route("", web::get().to(handlers::get_bootcamps))
                    .route("", web::post().to(handlers::create_bootcamp))
                    .route("/{id}", web::get().to(handlers::get_bootcamp))
                    .route("/{id}", web::put().to(handlers::update_bootcamp))
                    .route("/{id}", web::delete().to(handlers::delete_bootcamp)),
            )
            .service(
                web::scope("/courses")
                    .route("", web::get().to(handlers::get_courses))
                    .route("/{id}", web::get().to(handlers::get_course))
                    .route("/{id}", web::put().to(handlers::update_course))
                    .route("/{id}", web::delete().to(handlers::delete_course)),
            )
            .service(
                web::scope("/reviews")
                    .route("", web::get().to(handlers::get_reviews))
                    .route("/{id}", web::get().to(handlers::get_review))
                    .route("/{id}", web::put().to(handlers::update_review))
                    .route("/{id}", web::delete().to(handlers::delete_review)),
            ),
    );
}
