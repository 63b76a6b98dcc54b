use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    pub weeks: u32,
    pub tuition: f64,
    pub minimum_skill: SkillLevel,
    #[serde(default)]
    pub scholarship_available: bool,
    /// Parent bootcamp
    pub bootcamp: ObjectId,
    /// Creator; the only non-admin allowed to change the course
    pub user: ObjectId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, message = "Please add a course title"))]
    pub title: String,
    #[validate(length(min = 1, message = "Please add a description"))]
    pub description: String,
    #[validate(range(min = 1, message = "Please add number of weeks"))]
    pub weeks: u32,
    #[validate(range(min = 0.0, message = "Please add a tuition cost"))]
    pub tuition: f64,
    pub minimum_skill: SkillLevel,
    #[serde(default)]
    pub scholarship_available: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, message = "Please add a course title"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Please add a description"))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Please add number of weeks"))]
    pub weeks: Option<u32>,
    #[validate(range(min = 0.0, message = "Please add a tuition cost"))]
    pub tuition: Option<f64>,
    pub minimum_skill: Option<SkillLevel>,
    pub scholarship_available: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub weeks: u32,
    pub tuition: f64,
    pub minimum_skill: SkillLevel,
    pub scholarship_available: bool,
    pub bootcamp: serde_json::Value,
    pub user: String,
    pub created_at: DateTime<Utc>,
}

impl From<Course> for CourseResponse {
    fn from(c: Course) -> Self {
        CourseResponse {
            id: c.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            title: c.title,
            description: c.description,
            weeks: c.weeks,
            tuition: c.tuition,
            minimum_skill: c.minimum_skill,
            scholarship_available: c.scholarship_available,
            bootcamp: serde_json::Value::String(c.bootcamp.to_hex()),
            user: c.user.to_hex(),
            created_at: c.created_at,
        }
    }
}

impl CourseResponse {
    /// Replace the bootcamp id with an embedded `{ id, name, description }` summary
    pub fn with_bootcamp(mut self, id: &ObjectId, name: &str, description: &str) -> Self {
        self.bootcamp = serde_json::json!({
            "id": id.to_hex(),
            "name": name,
            "description": description,
        });
        self
    }
}
