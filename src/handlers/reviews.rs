//! Review handlers; one review per user and bootcamp
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
use crate::error::{is_duplicate_key, ErrorResponse};
use crate::middleware::CurrentUser;
use crate::models::{
    Bootcamp, CreateReviewRequest, Review, ReviewResponse, Role, UpdateReviewRequest, BOOTCAMPS,
    REVIEWS,
};
use crate::services::{ensure_owner, AverageService};
use crate::utils::{fetch_list, ListQuery, Populate};

const REVIEWERS: [Role; 2] = [Role::User, Role::Admin];

fn not_found(id: &str) -> ErrorResponse {
    ErrorResponse::not_found(format!("No review found with the id of {}", id))
}

fn no_bootcamp(id: &str) -> ErrorResponse {
    ErrorResponse::not_found(format!("No bootcamp with the id of {}", id))
}

async fn find_review(db: &Database, raw_id: &str) -> Result<Review, ErrorResponse> {
    let id = parse_id(raw_id, || not_found(raw_id))?;
    db.collection::<Review>(REVIEWS)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| not_found(raw_id))
}

/// GET /api/v1/reviews
/// GET /api/v1/bootcamps/{bootcamp_id}/reviews
pub async fn get_reviews(
    db: web::Data<Database>,
    bootcamp_id: Option<web::Path<String>>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, ErrorResponse> {
    if let Some(bootcamp_id) = bootcamp_id {
        let id = parse_id(&bootcamp_id, || no_bootcamp(&bootcamp_id))?;

        let mut cursor = db
            .collection::<Review>(REVIEWS)
            .find(doc! { "bootcamp": id })
            .sort(doc! { "created_at": -1 })
            .await?;

        let mut reviews = Vec::new();
        while let Some(review) = cursor.next().await {
            reviews.push(ReviewResponse::from(review?));
        }

        return Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "count": reviews.len(),
            "data": reviews,
        })));
    }

    let list_query = ListQuery::from_params(&query)?;
    let list = fetch_list(
        &db.collection::<Document>(REVIEWS),
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

/// GET /api/v1/reviews/{id}
pub async fn get_review(
    db: web::Data<Database>,
    id: web::Path<String>,
) -> Result<HttpResponse, ErrorResponse> {
    let review = find_review(&db, &id).await?;

    let bootcamp = db
        .collection::<Bootcamp>(BOOTCAMPS)
        .find_one(doc! { "_id": review.bootcamp })
        .await?;

    let mut response = ReviewResponse::from(review);
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

/// POST /api/v1/bootcamps/{bootcamp_id}/reviews
pub async fn add_review(
    db: web::Data<Database>,
    user: CurrentUser,
    bootcamp_id: web::Path<String>,
    body: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, ErrorResponse> {
    user.require_role(&REVIEWERS)?;

    let bid: ObjectId = parse_id(&bootcamp_id, || no_bootcamp(&bootcamp_id))?;
    db.collection::<Bootcamp>(BOOTCAMPS)
        .find_one(doc! { "_id": bid })
        .await?
        .ok_or_else(|| no_bootcamp(&bootcamp_id))?;

    body.validate()?;
    let req = body.into_inner();

    let mut review = Review {
        id: None,
        title: req.title,
        text: req.text,
        rating: req.rating,
        bootcamp: bid,
        user: user.id,
        created_at: Utc::now(),
    };

    let result = db
        .collection::<Review>(REVIEWS)
        .insert_one(&review)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                ErrorResponse::bad_request(format!(
                    "User {} has already reviewed bootcamp {}",
                    user.id, bid
                ))
            } else {
                ErrorResponse::from(e)
            }
        })?;
    review.id = result.inserted_id.as_object_id();

    AverageService::refresh_average_rating(&db, bid).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": ReviewResponse::from(review),
    })))
}

/// PUT /api/v1/reviews/{id}
pub async fn update_review(
    db: web::Data<Database>,
    user: CurrentUser,
    id: web::Path<String>,
    body: web::Json<UpdateReviewRequest>,
) -> Result<HttpResponse, ErrorResponse> {
    let review = find_review(&db, &id).await?;
    ensure_owner(&review.user, &user, "Not authorized to update review")?;
    body.validate()?;

    let req = body.into_inner();
    let mut set = Document::new();
    if let Some(title) = req.title {
        set.insert("title", title);
    }
    if let Some(text) = req.text {
        set.insert("text", text);
    }
    if let Some(rating) = req.rating {
        set.insert("rating", rating);
    }

    if set.is_empty() {
        return Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": ReviewResponse::from(review),
        })));
    }

    let updated = db
        .collection::<Review>(REVIEWS)
        .find_one_and_update(doc! { "_id": review.id }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| not_found(&id))?;

    AverageService::refresh_average_rating(&db, updated.bootcamp).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": ReviewResponse::from(updated),
    })))
}

/// DELETE /api/v1/reviews/{id}
pub async fn delete_review(
    db: web::Data<Database>,
    user: CurrentUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ErrorResponse> {
    let review = find_review(&db, &id).await?;
    ensure_owner(&review.user, &user, "Not authorized to delete review")?;

    db.collection::<Review>(REVIEWS)
        .delete_one(doc! { "_id": review.id })
        .await?;

    AverageService::refresh_average_rating(&db, review.bootcamp).await?;

    Ok(HttpResponse::NoContent().finish())
}
