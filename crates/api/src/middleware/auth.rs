//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tutora_shared::{Claims, JwtError, Role};
use tutora_shared::types::{StudentId, TeacherId};

use crate::AppState;
use crate::error::ApiError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Validates the bearer token and stores its claims in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::unauthorized("Authorization header with Bearer token is required")
            .into_response();
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(JwtError::Expired) => ApiError::unauthorized("Token has expired").into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::unauthorized("Invalid or malformed token").into_response()
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the caller's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.0.role
    }

    /// Returns true for platform admins.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0.is_admin()
    }

    /// The caller as a teacher.
    pub fn teacher_id(&self) -> Result<TeacherId, ApiError> {
        match self.0.role {
            Role::Teacher => Ok(TeacherId::from_uuid(self.0.user_id())),
            _ => Err(ApiError::forbidden("Only teachers can do this")),
        }
    }

    /// The caller as a student.
    pub fn student_id(&self) -> Result<StudentId, ApiError> {
        match self.0.role {
            Role::Student => Ok(StudentId::from_uuid(self.0.user_id())),
            _ => Err(ApiError::forbidden("Only students can do this")),
        }
    }

    /// Fails unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin role required"))
        }
    }

    /// Fails unless the caller is `teacher_id` or an admin.
    pub fn require_teacher_or_admin(&self, teacher_id: TeacherId) -> Result<(), ApiError> {
        if self.is_admin() || self.is_teacher(teacher_id) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Not allowed to access this teacher's data"))
        }
    }

    /// True if the caller is the teacher `teacher_id`.
    #[must_use]
    pub fn is_teacher(&self, teacher_id: TeacherId) -> bool {
        self.0.role == Role::Teacher && self.0.user_id() == teacher_id.into_inner()
    }

    /// True if the caller is the student `student_id`.
    #[must_use]
    pub fn is_student(&self, student_id: StudentId) -> bool {
        self.0.role == Role::Student && self.0.user_id() == student_id.into_inner()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn user(role: Role) -> (Uuid, AuthUser) {
        let id = Uuid::now_v7();
        (id, AuthUser(Claims::new(id, role, Utc::now() + Duration::minutes(5))))
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_teacher_may_only_access_own_data() {
        let (id, teacher) = user(Role::Teacher);
        assert!(teacher.require_teacher_or_admin(TeacherId::from_uuid(id)).is_ok());
        assert!(teacher.require_teacher_or_admin(TeacherId::new()).is_err());
        assert!(teacher.student_id().is_err());
    }

    #[test]
    fn test_admin_may_access_any_teacher() {
        let (_, admin) = user(Role::Admin);
        assert!(admin.require_teacher_or_admin(TeacherId::new()).is_ok());
        assert!(admin.require_admin().is_ok());
    }
}
