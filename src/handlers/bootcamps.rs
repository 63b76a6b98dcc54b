//! Bootcamp handlers - CRUD, radius search and photo upload
use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;
use mongodb::Database;
use serde_json::json;
use validator::Validate;

use super::parse_id;
use crate::config::AppConfig;
use crate::db::SINGLE_PUBLISH_INDEX;
use crate::error::{duplicate_key_index, ErrorResponse};
use crate::middleware::CurrentUser;
use crate::models::{
    Bootcamp, BootcampResponse, CreateBootcampRequest, GeoLocation, Role, UpdateBootcampRequest,
    BOOTCAMPS, COURSES, DEFAULT_PHOTO, REVIEWS,
};
use crate::services::{ensure_owner, locate, Geocoder, StorageService};
use crate::utils::{fetch_list, slugify, ListQuery, Populate};

/// Earth radius in miles; radius searches take their distance in miles
pub const EARTH_RADIUS_MILES: f64 = 3963.0;

const PUBLISHERS: [Role; 2] = [Role::Publisher, Role::Admin];

fn not_found(id: &str) -> ErrorResponse {
    ErrorResponse::not_found(format!("Bootcamp not found with id of {}", id))
}

/// Angular radius for `$centerSphere` from a distance in miles
pub fn radius_radians(distance_miles: f64) -> f64 {
    distance_miles / EARTH_RADIUS_MILES
}

/// Filter matching bootcamps located inside the spherical cap around a point
pub fn radius_filter(longitude: f64, latitude: f64, radius: f64) -> Document {
    doc! {
        "location": {
            "$geoWithin": { "$centerSphere": [[longitude, latitude], radius] }
        }
    }
}

async fn geocode_address(geocoder: &dyn Geocoder, address: &str) -> Result<GeoLocation, ErrorResponse> {
    match locate(geocoder, address).await {
        Ok(result) => Ok(result.into_location()),
        Err(e) if e.status == actix_web::http::StatusCode::NOT_FOUND => {
            Err(ErrorResponse::bad_request(format!("Could not geocode address {}", address)))
        }
        Err(e) => Err(e),
    }
}

async fn find_bootcamp(db: &Database, raw_id: &str) -> Result<Bootcamp, ErrorResponse> {
    let id = parse_id(raw_id, || not_found(raw_id))?;
    db.collection::<Bootcamp>(BOOTCAMPS)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| not_found(raw_id))
}

/// List bootcamps with filtering, paging and their courses embedded
/// GET /api/v1/bootcamps
pub async fn get_bootcamps(
    db: web::Data<Database>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, ErrorResponse> {
    let list_query = ListQuery::from_params(&query)?;
    let mut list = fetch_list(
        &db.collection::<Document>(BOOTCAMPS),
        &list_query,
        Some(Populate::Children {
            from: COURSES,
            foreign_field: "bootcamp",
            as_field: "courses",
        }),
    )
    .await?;

    for item in &mut list.data {
        if let Some(obj) = item.as_object_mut() {
            obj.remove("exclusive_owner");
        }
    }

    Ok(HttpResponse::Ok().json(list))
}

/// GET /api/v1/bootcamps/{id}
pub async fn get_bootcamp(
    db: web::Data<Database>,
    id: web::Path<String>,
) -> Result<HttpResponse, ErrorResponse> {
    let bootcamp = find_bootcamp(&db, &id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": BootcampResponse::from(bootcamp),
    })))
}

/// Publish a bootcamp; non-admins may own only one
/// POST /api/v1/bootcamps
pub async fn create_bootcamp(
    db: web::Data<Database>,
    geocoder: web::Data<dyn Geocoder>,
    user: CurrentUser,
    body: web::Json<CreateBootcampRequest>,
) -> Result<HttpResponse, ErrorResponse> {
    user.require_role(&PUBLISHERS)?;
    body.validate()?;

    let req = body.into_inner();
    let location = geocode_address(geocoder.get_ref(), &req.address).await?;

    let mut bootcamp = Bootcamp {
        id: None,
        slug: slugify(&req.name),
        name: req.name,
        description: req.description,
        website: req.website,
        phone: req.phone,
        email: req.email,
        location: Some(location),
        careers: req.careers,
        average_rating: None,
        average_cost: None,
        photo: DEFAULT_PHOTO.to_string(),
        housing: req.housing,
        job_assistance: req.job_assistance,
        job_guarantee: req.job_guarantee,
        accept_gi: req.accept_gi,
        user: user.id,
        exclusive_owner: (!user.is_admin()).then_some(user.id),
        created_at: Utc::now(),
    };

    let result = db
        .collection::<Bootcamp>(BOOTCAMPS)
        .insert_one(&bootcamp)
        .await
        .map_err(|e| {
            if duplicate_key_index(&e) == Some(SINGLE_PUBLISH_INDEX) {
                ErrorResponse::bad_request(format!(
                    "The user with ID {} has already published a bootcamp",
                    user.id
                ))
            } else {
                ErrorResponse::from(e)
            }
        })?;

    bootcamp.id = result.inserted_id.as_object_id();
    log::info!("Bootcamp {} created by {}", bootcamp.name, user.id);

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": BootcampResponse::from(bootcamp),
    })))
}

/// PUT /api/v1/bootcamps/{id}
pub async fn update_bootcamp(
    db: web::Data<Database>,
    geocoder: web::Data<dyn Geocoder>,
    user: CurrentUser,
    id: web::Path<String>,
    body: web::Json<UpdateBootcampRequest>,
) -> Result<HttpResponse, ErrorResponse> {
    user.require_role(&PUBLISHERS)?;
    let bootcamp = find_bootcamp(&db, &id).await?;

    ensure_owner(
        &bootcamp.user,
        &user,
        format!("User {} is not authorized to update this bootcamp", user.id),
    )?;
    body.validate()?;

    let req = body.into_inner();
    let mut set = Document::new();

    if let Some(name) = req.name {
        set.insert("slug", slugify(&name));
        set.insert("name", name);
    }
    if let Some(description) = req.description {
        set.insert("description", description);
    }
    if let Some(website) = req.website {
        set.insert("website", website);
    }
    if let Some(phone) = req.phone {
        set.insert("phone", phone);
    }
    if let Some(email) = req.email {
        set.insert("email", email);
    }
    if let Some(address) = req.address {
        let location = geocode_address(geocoder.get_ref(), &address).await?;
        set.insert("location", mongodb::bson::to_bson(&location)?);
    }
    if let Some(careers) = req.careers {
        set.insert("careers", mongodb::bson::to_bson(&careers)?);
    }
    for (field, value) in [
        ("housing", req.housing),
        ("job_assistance", req.job_assistance),
        ("job_guarantee", req.job_guarantee),
        ("accept_gi", req.accept_gi),
    ] {
        if let Some(value) = value {
            set.insert(field, value);
        }
    }

    if set.is_empty() {
        return Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": BootcampResponse::from(bootcamp),
        })));
    }

    let updated = db
        .collection::<Bootcamp>(BOOTCAMPS)
        .find_one_and_update(doc! { "_id": bootcamp.id }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| not_found(&id))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": BootcampResponse::from(updated),
    })))
}

/// Delete a bootcamp together with its courses and reviews
/// DELETE /api/v1/bootcamps/{id}
pub async fn delete_bootcamp(
    db: web::Data<Database>,
    user: CurrentUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ErrorResponse> {
    user.require_role(&PUBLISHERS)?;
    let bootcamp = find_bootcamp(&db, &id).await?;

    ensure_owner(
        &bootcamp.user,
        &user,
        format!("User {} is not authorized to delete this bootcamp", user.id),
    )?;

    let bootcamp_id = bootcamp.id;
    db.collection::<Bootcamp>(BOOTCAMPS)
        .delete_one(doc! { "_id": bootcamp_id })
        .await?;

    let courses = db
        .collection::<Document>(COURSES)
        .delete_many(doc! { "bootcamp": bootcamp_id })
        .await?;
    let reviews = db
        .collection::<Document>(REVIEWS)
        .delete_many(doc! { "bootcamp": bootcamp_id })
        .await?;

    log::info!(
        "Bootcamp {} deleted with {} courses and {} reviews",
        id,
        courses.deleted_count,
        reviews.deleted_count
    );

    Ok(HttpResponse::NoContent().finish())
}

/// Bootcamps within `distance` miles of a zipcode
/// GET /api/v1/bootcamps/radius/{zipcode}/{distance}
pub async fn get_bootcamps_in_radius(
    db: web::Data<Database>,
    geocoder: web::Data<dyn Geocoder>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ErrorResponse> {
    let (zipcode, distance) = path.into_inner();
    let distance: f64 = distance
        .parse()
        .ok()
        .filter(|d: &f64| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| ErrorResponse::bad_request(format!("Invalid distance {}", distance)))?;

    let point = locate(geocoder.get_ref(), &zipcode).await?;
    let filter = radius_filter(point.longitude, point.latitude, radius_radians(distance));

    let mut cursor = db.collection::<Bootcamp>(BOOTCAMPS).find(filter).await?;
    let mut bootcamps = Vec::new();
    while let Some(bootcamp) = cursor.next().await {
        bootcamps.push(BootcampResponse::from(bootcamp?));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "results": bootcamps.len(),
        "data": bootcamps,
    })))
}

/// Upload the bootcamp photo, stored as `photo_<id><ext>`
/// PUT /api/v1/bootcamps/{id}/photo
pub async fn bootcamp_photo_upload(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    user: CurrentUser,
    id: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, ErrorResponse> {
    user.require_role(&PUBLISHERS)?;
    let bootcamp = find_bootcamp(&db, &id).await?;

    ensure_owner(
        &bootcamp.user,
        &user,
        format!("User {} is not authorized to update this bootcamp", user.id),
    )?;

    let photo = StorageService::read_photo(payload, config.max_file_upload)
        .await?
        .ok_or_else(|| ErrorResponse::bad_request("Please upload a file"))?;

    let bootcamp_id: ObjectId = bootcamp.id.ok_or_else(|| not_found(&id))?;
    let file_name = StorageService::photo_file_name(&bootcamp_id, &photo.original_name);
    StorageService::save_photo(&config.file_upload_path, &file_name, &photo.bytes).await?;

    db.collection::<Bootcamp>(BOOTCAMPS)
        .update_one(doc! { "_id": bootcamp_id }, doc! { "$set": { "photo": file_name.as_str() } })
        .await?;

    log::info!("Stored photo {} ({} bytes)", file_name, photo.bytes.len());

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": file_name,
    })))
}
