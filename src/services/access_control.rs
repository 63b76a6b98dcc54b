//! Ownership checks shared by every mutating endpoint
use mongodb::bson::oid::ObjectId;

use crate::error::ErrorResponse;
use crate::middleware::CurrentUser;
use crate::models::Role;

/// A resource may be changed by its owner or by an admin
pub fn is_owner_or_admin(owner: &ObjectId, requester_id: &ObjectId, requester_role: Role) -> bool {
    owner == requester_id || requester_role == Role::Admin
}

/// 401 with `message` unless `user` owns the resource or is an admin
pub fn ensure_owner(owner: &ObjectId, user: &CurrentUser, message: impl Into<String>) -> Result<(), ErrorResponse> {
    if is_owner_or_admin(owner, &user.id, user.role) {
        Ok(())
    } else {
        log::warn!("User {} denied on resource owned by {}", user.id, owner);
        Err(ErrorResponse::unauthorized(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_may_mutate() {
        let owner = ObjectId::new();
        assert!(is_owner_or_admin(&owner, &owner, Role::Publisher));
        assert!(is_owner_or_admin(&owner, &owner, Role::User));
    }

    #[test]
    fn test_admin_may_mutate_anything() {
        assert!(is_owner_or_admin(&ObjectId::new(), &ObjectId::new(), Role::Admin));
    }

    #[test]
    fn test_stranger_is_refused() {
        let owner = ObjectId::new();
        let stranger = CurrentUser {
            id: ObjectId::new(),
            role: Role::Publisher,
        };
        assert!(!is_owner_or_admin(&owner, &stranger.id, stranger.role));

        let err = ensure_owner(&owner, &stranger, "not yours").unwrap_err();
        assert_eq!(err.status, actix_web::http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "not yours");
    }
}
