//! Typed API error carrying an HTTP status, rendered as `{ success: false, error }`
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// MongoDB server error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ErrorResponse {
    pub message: String,
    pub status: StatusCode,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::UNAUTHORIZED)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::FORBIDDEN)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl ResponseError for ErrorResponse {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(json!({
            "success": false,
            "error": self.message,
        }))
    }
}

/// Server message of a unique index violation, if `err` is one
fn duplicate_key_message(err: &mongodb::error::Error) -> Option<&str> {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY => {
            Some(e.message.as_str())
        }
        ErrorKind::Command(e) if e.code == DUPLICATE_KEY => Some(e.message.as_str()),
        _ => None,
    }
}

/// True when a MongoDB error was raised by a unique index
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    duplicate_key_message(err).is_some()
}

/// Name of the index a duplicate-key error was raised by
pub fn duplicate_key_index(err: &mongodb::error::Error) -> Option<&str> {
    duplicate_key_message(err).and_then(index_name_from_message)
}

/// `E11000 duplicate key error collection: db.coll index: <name> dup key: ...`
fn index_name_from_message(message: &str) -> Option<&str> {
    message
        .split_once(" index: ")
        .and_then(|(_, rest)| rest.split_whitespace().next())
}

impl From<mongodb::error::Error> for ErrorResponse {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            return ErrorResponse::bad_request("Duplicate field value entered");
        }
        log::error!("Database error: {}", err);
        ErrorResponse::internal("Server Error")
    }
}

impl From<validator::ValidationErrors> for ErrorResponse {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid value for {}", field),
                })
            })
            .collect();
        messages.sort();
        ErrorResponse::bad_request(messages.join(", "))
    }
}

impl From<mongodb::bson::ser::Error> for ErrorResponse {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        log::error!("Serialization error: {}", err);
        ErrorResponse::internal("Server Error")
    }
}

impl From<mongodb::bson::de::Error> for ErrorResponse {
    fn from(err: mongodb::bson::de::Error) -> Self {
        log::error!("Deserialization error: {}", err);
        ErrorResponse::internal("Server Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Please add a name"))]
        name: String,
        #[validate(range(min = 1, max = 10, message = "Rating must be between 1 and 10"))]
        rating: i32,
    }

    #[actix_web::test]
    async fn test_error_body_shape() {
        let err = ErrorResponse::not_found("Bootcamp not found with id of abc");
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Bootcamp not found with id of abc");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_index_name_from_duplicate_key_message() {
        let message = "E11000 duplicate key error collection: devcamper.bootcamps \
                       index: bootcamps_single_publish dup key: { exclusive_owner: ObjectId('5d7a514b5d2c12c7449be042') }";
        assert_eq!(index_name_from_message(message), Some("bootcamps_single_publish"));

        let message = "E11000 duplicate key error collection: devcamper.bootcamps index: name_1 dup key: { name: \"Devworks\" }";
        assert_eq!(index_name_from_message(message), Some("name_1"));

        assert_eq!(index_name_from_message("WriteConflict"), None);
    }

    #[test]
    fn test_validation_errors_are_bad_request() {
        let sample = Sample {
            name: String::new(),
            rating: 11,
        };
        let err: ErrorResponse = sample.validate().unwrap_err().into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.message,
            "Please add a name, Rating must be between 1 and 10"
        );
    }
}
