use actix_web::cookie::{time::Duration, Cookie};
use actix_web::{web, HttpResponse};
use mongodb::{bson::doc, Database};
use serde::Serialize;
use validator::Validate;

use crate::config::AppConfig;
use crate::error::{is_duplicate_key, ErrorResponse};
use crate::middleware::{CurrentUser, TOKEN_COOKIE};
use crate::models::{LoginRequest, RegisterRequest, Role, User, UserResponse, USERS};
use crate::utils::create_token;

/// Auth response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Issue a token for `user` in both the body and an http-only cookie
fn token_response(
    user_id: &str,
    role: Role,
    config: &AppConfig,
    mut builder: actix_web::HttpResponseBuilder,
) -> Result<HttpResponse, ErrorResponse> {
    let token = create_token(user_id, role, &config.jwt_secret, config.jwt_expiration)
        .map_err(|e| {
            log::error!("Failed to create token: {}", e);
            ErrorResponse::internal("Failed to create token")
        })?;

    let cookie = Cookie::build(TOKEN_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .secure(config.production)
        .max_age(Duration::days(config.jwt_cookie_expire_days))
        .finish();

    Ok(builder.cookie(cookie).json(AuthResponse {
        success: true,
        token,
    }))
}

/// Register a user or publisher
/// POST /api/v1/auth/register
pub async fn register(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ErrorResponse> {
    body.validate()?;
    let req = body.into_inner();

    let role = req.role.unwrap_or_default();
    if role == Role::Admin {
        return Err(ErrorResponse::bad_request("Role admin cannot be self-assigned"));
    }

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST).map_err(|e| {
        log::error!("Failed to hash password: {}", e);
        ErrorResponse::internal("Failed to hash password")
    })?;

    let user = User {
        id: None,
        name: req.name,
        email: normalize_email(&req.email),
        role,
        password_hash,
        created_at: chrono::Utc::now(),
    };

    let result = db
        .collection::<User>(USERS)
        .insert_one(&user)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                ErrorResponse::bad_request("User already exists")
            } else {
                ErrorResponse::from(e)
            }
        })?;

    let user_id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ErrorResponse::internal("Failed to get user ID"))?
        .to_hex();

    log::info!("Registered {} as {}", user.email, role);
    token_response(&user_id, role, &config, HttpResponse::Created())
}

/// POST /api/v1/auth/login
pub async fn login(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ErrorResponse> {
    body.validate()?;

    let email = normalize_email(&body.email);
    let user = db
        .collection::<User>(USERS)
        .find_one(doc! { "email": &email })
        .await?
        .ok_or_else(|| ErrorResponse::unauthorized("Invalid credentials"))?;

    let valid = bcrypt::verify(&body.password, &user.password_hash).map_err(|e| {
        log::error!("Password verification error: {}", e);
        ErrorResponse::internal("Failed to verify password")
    })?;
    if !valid {
        return Err(ErrorResponse::unauthorized("Invalid credentials"));
    }

    let user_id = user
        .id
        .map(|oid| oid.to_hex())
        .ok_or_else(|| ErrorResponse::internal("User without id"))?;

    token_response(&user_id, user.role, &config, HttpResponse::Ok())
}

/// Profile of the authenticated user
/// GET /api/v1/auth/me
pub async fn me(
    db: web::Data<Database>,
    user: CurrentUser,
) -> Result<HttpResponse, ErrorResponse> {
    let found = db
        .collection::<User>(USERS)
        .find_one(doc! { "_id": user.id })
        .await?
        .ok_or_else(|| ErrorResponse::not_found("User not found"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": UserResponse::from(found),
    })))
}

/// Clear the auth cookie
/// GET /api/v1/auth/logout
pub async fn logout() -> HttpResponse {
    let cookie = Cookie::build(TOKEN_COOKIE, "none")
        .path("/")
        .http_only(true)
        .max_age(Duration::seconds(10))
        .finish();

    HttpResponse::Ok().cookie(cookie).json(serde_json::json!({
        "success": true,
        "data": {},
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  John@Gmail.com "), "john@gmail.com");
    }

    #[actix_web::test]
    async fn test_token_response_sets_cookie() {
        let config = AppConfig {
            jwt_secret: "cookie-secret".to_string(),
            ..AppConfig::default()
        };
        let resp = token_response("abc", Role::User, &config, HttpResponse::Ok()).unwrap();

        let cookie = resp
            .cookies()
            .find(|c| c.name() == TOKEN_COOKIE)
            .expect("token cookie");
        assert!(cookie.http_only().unwrap_or(false));

        let token = cookie.value().to_string();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["token"], token);

        let claims = crate::utils::verify_token(&token, "cookie-secret").unwrap();
        assert_eq!(claims.sub, "abc");
    }
}
