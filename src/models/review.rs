use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub text: String,
    /// 1 to 10
    pub rating: i32,
    pub bootcamp: ObjectId,
    pub user: ObjectId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, max = 100, message = "Please add a title for the review"))]
    pub title: String,
    #[validate(length(min = 1, message = "Please add some text"))]
    pub text: String,
    #[validate(range(min = 1, max = 10, message = "Please add a rating between 1 and 10"))]
    pub rating: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1, max = 100, message = "Please add a title for the review"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Please add some text"))]
    pub text: Option<String>,
    #[validate(range(min = 1, max = 10, message = "Please add a rating between 1 and 10"))]
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub title: String,
    pub text: String,
    pub rating: i32,
    pub bootcamp: serde_json::Value,
    pub user: String,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        ReviewResponse {
            id: r.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            title: r.title,
            text: r.text,
            rating: r.rating,
            bootcamp: serde_json::Value::String(r.bootcamp.to_hex()),
            user: r.user.to_hex(),
            created_at: r.created_at,
        }
    }
}

impl ReviewResponse {
    pub fn with_bootcamp(mut self, id: &ObjectId, name: &str, description: &str) -> Self {
        self.bootcamp = serde_json::json!({
            "id": id.to_hex(),
            "name": name,
            "description": description,
        });
        self
    }
}
