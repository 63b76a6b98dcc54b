pub mod auth;
pub mod bootcamps;
pub mod courses;
mod health;
pub mod reviews;

use mongodb::bson::oid::ObjectId;

use crate::error::ErrorResponse;

pub use auth::{login, logout, me, register};
pub use bootcamps::{
    bootcamp_photo_upload, create_bootcamp, delete_bootcamp, get_bootcamp, get_bootcamps,
    get_bootcamps_in_radius, update_bootcamp,
};
pub use courses::{add_course, delete_course, get_course, get_courses, update_course};
pub use health::{health, readiness};
pub use reviews::{add_review, delete_review, get_review, get_reviews, update_review};

/// Parse a path id; a malformed id is reported like a missing resource
pub(crate) fn parse_id(
    raw: &str,
    not_found: impl FnOnce() -> ErrorResponse,
) -> Result<ObjectId, ErrorResponse> {
    ObjectId::parse_str(raw.trim()).map_err(|_| not_found())
}
