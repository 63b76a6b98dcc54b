//! Bootcamp listings and their request/response shapes
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_PHOTO: &str = "no-photo.jpg";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bootcamp {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub name: String,

    /// URL-friendly form of `name`
    pub slug: String,

    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Geocoded from the address given at creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,

    pub careers: Vec<Career>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_cost: Option<f64>,

    #[serde(default = "default_photo")]
    pub photo: String,

    #[serde(default)]
    pub housing: bool,

    #[serde(default)]
    pub job_assistance: bool,

    #[serde(default)]
    pub job_guarantee: bool,

    #[serde(default)]
    pub accept_gi: bool,

    /// Owner of the listing
    pub user: ObjectId,

    /// Mirrors `user` for non-admin publishers; a unique partial index on it
    /// caps those publishers at one bootcamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_owner: Option<ObjectId>,

    pub created_at: DateTime<Utc>,
}

fn default_photo() -> String {
    DEFAULT_PHOTO.to_string()
}

/// GeoJSON point plus the formatted address returned by the geocoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zipcode: String,
    #[serde(default)]
    pub country: String,
}

impl GeoLocation {
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [longitude, latitude],
            formatted_address: String::new(),
            street: String::new(),
            city: String::new(),
            state: String::new(),
            zipcode: String::new(),
            country: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Career {
    #[serde(rename = "Web Development")]
    WebDevelopment,
    #[serde(rename = "Mobile Development")]
    MobileDevelopment,
    #[serde(rename = "UI/UX")]
    UiUx,
    #[serde(rename = "Data Science")]
    DataScience,
    Business,
    Other,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBootcampRequest {
    #[validate(length(min = 1, max = 50, message = "Name can not be more than 50 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 500, message = "Description can not be more than 500 characters"))]
    pub description: String,
    #[validate(url(message = "Please use a valid URL with HTTP or HTTPS"))]
    pub website: Option<String>,
    #[validate(length(max = 20, message = "Phone number can not be longer than 20 characters"))]
    pub phone: Option<String>,
    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Please add an address"))]
    pub address: String,
    #[validate(length(min = 1, message = "Please add at least one career"))]
    pub careers: Vec<Career>,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBootcampRequest {
    #[validate(length(min = 1, max = 50, message = "Name can not be more than 50 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 500, message = "Description can not be more than 500 characters"))]
    pub description: Option<String>,
    #[validate(url(message = "Please use a valid URL with HTTP or HTTPS"))]
    pub website: Option<String>,
    #[validate(length(max = 20, message = "Phone number can not be longer than 20 characters"))]
    pub phone: Option<String>,
    #[validate(email(message = "Please add a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Please add an address"))]
    pub address: Option<String>,
    #[validate(length(min = 1, message = "Please add at least one career"))]
    pub careers: Option<Vec<Career>>,
    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BootcampResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
    pub careers: Vec<Career>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_cost: Option<f64>,
    pub photo: String,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,
    pub user: String,
    pub created_at: DateTime<Utc>,
}

impl From<Bootcamp> for BootcampResponse {
    fn from(b: Bootcamp) -> Self {
        BootcampResponse {
            id: b.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            name: b.name,
            slug: b.slug,
            description: b.description,
            website: b.website,
            phone: b.phone,
            email: b.email,
            location: b.location,
            careers: b.careers,
            average_rating: b.average_rating,
            average_cost: b.average_cost,
            photo: b.photo,
            housing: b.housing,
            job_assistance: b.job_assistance,
            job_guarantee: b.job_guarantee,
            accept_gi: b.accept_gi,
            user: b.user.to_hex(),
            created_at: b.created_at,
        }
    }
}
