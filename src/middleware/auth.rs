use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use mongodb::bson::oid::ObjectId;
use std::future::{ready, Ready};

use crate::config::AppConfig;
use crate::error::ErrorResponse;
use crate::models::Role;
use crate::utils::{verify_token, Claims};

pub const TOKEN_COOKIE: &str = "token";
pub const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// Decodes the bearer token (or `token` cookie) of every request.
///
/// Valid claims are stored in the request extensions for [`CurrentUser`].
/// Requests without a usable token pass through untouched; protected handlers
/// reject them when they extract the current user.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

/// Token from `Authorization: Bearer <token>`, falling back to the auth cookie
fn extract_token(req: &ServiceRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    from_header.or_else(|| {
        req.cookie(TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty() && token != "none")
    })
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(token) = extract_token(&req) {
            let secret = req
                .app_data::<web::Data<AppConfig>>()
                .map(|config| config.jwt_secret.clone())
                .unwrap_or_default();

            match verify_token(&token, &secret) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                }
                Err(e) => log::debug!("Ignoring invalid token on {}: {}", req.path(), e),
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}

/// The authenticated requester, extracted from the claims the middleware stored
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: ObjectId,
    pub role: Role,
}

impl CurrentUser {
    /// 403 unless the requester holds one of `roles`
    pub fn require_role(&self, roles: &[Role]) -> Result<(), ErrorResponse> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ErrorResponse::forbidden(format!(
                "User role {} is not authorized to access this route",
                self.role
            )))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequest for CurrentUser {
    type Error = ErrorResponse;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req
            .extensions()
            .get::<Claims>()
            .and_then(|claims| {
                ObjectId::parse_str(&claims.sub)
                    .ok()
                    .map(|id| CurrentUser { id, role: claims.role })
            })
            .ok_or_else(|| ErrorResponse::unauthorized(NOT_AUTHORIZED));
        ready(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App, HttpResponse};

    use crate::utils::create_token;

    async fn whoami(user: CurrentUser) -> HttpResponse {
        HttpResponse::Ok().body(format!("{}:{}", user.id.to_hex(), user.role))
    }

    async fn public() -> HttpResponse {
        HttpResponse::Ok().body("public")
    }

    fn config() -> AppConfig {
        AppConfig {
            jwt_secret: "middleware-secret".to_string(),
            ..AppConfig::default()
        }
    }

    #[actix_web::test]
    async fn test_public_route_ignores_tokens() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config()))
                .wrap(AuthMiddleware)
                .route("/public", web::get().to(public)),
        )
        .await;

        let req = test::TestRequest::get().uri("/public").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/public")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_protected_route_requires_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config()))
                .wrap(AuthMiddleware)
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_bearer_and_cookie_tokens() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config()))
                .wrap(AuthMiddleware)
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let id = ObjectId::new();
        let token = create_token(&id.to_hex(), Role::Publisher, "middleware-secret", 60).unwrap();

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, format!("{}:publisher", id.to_hex()).as_bytes());

        let req = test::TestRequest::get()
            .uri("/me")
            .cookie(actix_web::cookie::Cookie::new(TOKEN_COOKIE, token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_require_role() {
        let publisher = CurrentUser {
            id: ObjectId::new(),
            role: Role::Publisher,
        };
        assert!(publisher.require_role(&[Role::Publisher, Role::Admin]).is_ok());

        let err = publisher.require_role(&[Role::User, Role::Admin]).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "User role publisher is not authorized to access this route");
    }
}
