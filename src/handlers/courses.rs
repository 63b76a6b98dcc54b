//! Course handlers; courses are listed and created beneath their bootcamp
use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;
use mongodb::Database;
use serde_json::json;
use validator::Validate;

use super::parse_id;
use crate::error::ErrorResponse;
use crate::middleware::CurrentUser;
use crate::models::{
    Bootcamp, Course, CourseResponse, CreateCourseRequest, Role, UpdateCourseRequest, BOOTCAMPS,
    COURSES,
};
use crate::services::{ensure_owner, AverageService};
use crate::utils::{fetch_list, ListQuery, Populate};

const PUBLISHERS: [Role; 2] = [Role::Publisher, Role::Admin];

fn not_found(id: &str) -> ErrorResponse {
    ErrorResponse::not_found(format!("No course with the id of {}", id))
}

fn no_bootcamp(id: &str) -> ErrorResponse {
    ErrorResponse::not_found(format!("No bootcamp with the id of {}", id))
}

async fn find_course(db: &Database, raw_id: &str) -> Result<Course, ErrorResponse> {
    let id = parse_id(raw_id, || not_found(raw_id))?;
    db.collection::<Course>(COURSES)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| not_found(raw_id))
}

/// All courses (with filtering and paging), or every course of one bootcamp
/// GET /api/v1/courses
/// GET /api/v1/bootcamps/{bootcamp_id}/courses
pub async fn get_courses(
    db: web::Data<Database>,
    bootcamp_id: Option<web::Path<String>>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, ErrorResponse> {
    if let Some(bootcamp_id) = bootcamp_id {
        let id = parse_id(&bootcamp_id, || no_bootcamp(&bootcamp_id))?;

        let mut cursor = db
            .collection::<Course>(COURSES)
            .find(doc! { "bootcamp": id })
            .sort(doc! { "created_at": 1 })
            .await?;

        let mut courses = Vec::new();
        while let Some(course) = cursor.next().await {
            courses.push(CourseResponse::from(course?));
        }

        return Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "count": courses.len(),
            "data": courses,
        })));
    }

    let list_query = ListQuery::from_params(&query)?;
    let list = fetch_list(
        &db.collection::<Document>(COURSES),
        &list_query,
        Some(Populate::Parent {
            from: BOOTCAMPS,
            local_field: "bootcamp",
            fields: &["name", "description"],
        }),
    )
    .await?;

    Ok(HttpResponse::Ok().json(list))
}

/// Single course with its bootcamp's name and description embedded
/// GET /api/v1/courses/{id}
pub async fn get_course(
    db: web::Data<Database>,
    id: web::Path<String>,
) -> Result<HttpResponse, ErrorResponse> {
    let course = find_course(&db, &id).await?;

    let bootcamp = db
        .collection::<Bootcamp>(BOOTCAMPS)
        .find_one(doc! { "_id": course.bootcamp })
        .await?;

    let mut response = CourseResponse::from(course);
    if let Some(b) = bootcamp {
        if let Some(bid) = b.id {
            response = response.with_bootcamp(&bid, &b.name, &b.description);
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": response,
    })))
}

/// POST /api/v1/bootcamps/{bootcamp_id}/courses
pub async fn add_course(
    db: web::Data<Database>,
    user: CurrentUser,
    bootcamp_id: web::Path<String>,
    body: web::Json<CreateCourseRequest>,
) -> Result<HttpResponse, ErrorResponse> {
    user.require_role(&PUBLISHERS)?;

    let bid: ObjectId = parse_id(&bootcamp_id, || no_bootcamp(&bootcamp_id))?;
    let bootcamp = db
        .collection::<Bootcamp>(BOOTCAMPS)
        .find_one(doc! { "_id": bid })
        .await?
        .ok_or_else(|| no_bootcamp(&bootcamp_id))?;

    ensure_owner(
        &bootcamp.user,
        &user,
        format!(
            "User {} is not authorized to add a course to bootcamp {}",
            user.id, bid
        ),
    )?;
    body.validate()?;

    let req = body.into_inner();
    let mut course = Course {
        id: None,
        title: req.title,
        description: req.description,
        weeks: req.weeks,
        tuition: req.tuition,
        minimum_skill: req.minimum_skill,
        scholarship_available: req.scholarship_available,
        bootcamp: bid,
        user: user.id,
        created_at: Utc::now(),
    };

    let result = db.collection::<Course>(COURSES).insert_one(&course).await?;
    course.id = result.inserted_id.as_object_id();

    AverageService::refresh_average_cost(&db, bid).await?;
    log::info!("Course {} added to bootcamp {}", course.title, bid);

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": CourseResponse::from(course),
    })))
}

/// PUT /api/v1/courses/{id}
pub async fn update_course(
    db: web::Data<Database>,
    user: CurrentUser,
    id: web::Path<String>,
    body: web::Json<UpdateCourseRequest>,
) -> Result<HttpResponse, ErrorResponse> {
    user.require_role(&PUBLISHERS)?;
    let course = find_course(&db, &id).await?;

    ensure_owner(
        &course.user,
        &user,
        format!("User {} is not authorized to update course {}", user.id, id.as_str()),
    )?;
    body.validate()?;

    let req = body.into_inner();
    let mut set = Document::new();
    if let Some(title) = req.title {
        set.insert("title", title);
    }
    if let Some(description) = req.description {
        set.insert("description", description);
    }
    if let Some(weeks) = req.weeks {
        set.insert("weeks", weeks);
    }
    if let Some(tuition) = req.tuition {
        set.insert("tuition", tuition);
    }
    if let Some(skill) = req.minimum_skill {
        set.insert("minimum_skill", mongodb::bson::to_bson(&skill)?);
    }
    if let Some(scholarship) = req.scholarship_available {
        set.insert("scholarship_available", scholarship);
    }

    if set.is_empty() {
        return Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": CourseResponse::from(course),
        })));
    }

    let updated = db
        .collection::<Course>(COURSES)
        .find_one_and_update(doc! { "_id": course.id }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| not_found(&id))?;

    AverageService::refresh_average_cost(&db, updated.bootcamp).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": CourseResponse::from(updated),
    })))
}

/// DELETE /api/v1/courses/{id}
pub async fn delete_course(
    db: web::Data<Database>,
    user: CurrentUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ErrorResponse> {
    user.require_role(&PUBLISHERS)?;
    let course = find_course(&db, &id).await?;

    ensure_owner(
        &course.user,
        &user,
        format!("User {} is not authorized to delete course {}", user.id, id.as_str()),
    )?;

    db.collection::<Course>(COURSES)
        .delete_one(doc! { "_id": course.id })
        .await?;

    AverageService::refresh_average_cost(&db, course.bootcamp).await?;
    log::info!("Course {} deleted", id);

    Ok(HttpResponse::NoContent().finish())
}
