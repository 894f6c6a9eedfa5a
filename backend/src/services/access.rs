//! Role checks performed before any state is touched.

use crate::{
    error::AppError,
    models::{session::SessionData, user::UserRole},
};

pub const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];
pub const STAFF: &[UserRole] = &[UserRole::Admin, UserRole::Faculty];
pub const STUDENT_ONLY: &[UserRole] = &[UserRole::Student];

/// Fails with 403 unless the session role is one of `allowed`.
pub fn ensure_role(session: &SessionData, allowed: &[UserRole]) -> Result<(), AppError> {
    if allowed.contains(&session.role) {
        Ok(())
    } else {
        tracing::debug!(
            username = %session.username,
            role = %session.role,
            "Rejected by role check"
        );
        Err(AppError::Forbidden("Unauthorized".to_string()))
    }
}

/// Admins may act on anyone; everyone else only on themselves.
pub fn ensure_self_or_admin(session: &SessionData, target_username: &str) -> Result<(), AppError> {
    if session.role == UserRole::Admin || session.username == target_username {
        Ok(())
    } else {
        Err(AppError::Forbidden("Unauthorized".to_string()))
    }
}
