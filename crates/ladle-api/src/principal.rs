//! The authenticated principal.
//!
//! Authentication itself happens upstream; the gateway forwards the verified
//! identity as `x-user-id` and `x-user-role` headers. Requests without the
//! headers are anonymous, which is a valid caller for the public read
//! endpoints.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
    Service,
}

#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub user_id: Option<Uuid>,
    pub role: Role,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            role: Role::User,
        }
    }

    pub fn user(id: Uuid) -> Self {
        Self {
            user_id: Some(id),
            role: Role::User,
        }
    }

    pub fn is_self(&self, target: Uuid) -> bool {
        self.user_id == Some(target)
    }

    /// Self, admin, or a trusted service caller may manage a user-scoped
    /// resource.
    pub fn can_manage(&self, target: Uuid) -> bool {
        self.is_self(target) || matches!(self.role, Role::Admin | Role::Service)
    }

    /// The principal's own user id, or `AccessDenied` for anonymous callers.
    pub fn require_user(&self) -> Result<Uuid, ApiError> {
        self.user_id.ok_or(ApiError::AccessDenied)
    }
}

/// Turn the forwarded identity headers into a [`Principal`] extension.
pub async fn attach_principal(mut req: Request, next: Next) -> Response {
    let user_id = match req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(raw) => match raw.parse::<Uuid>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("ignoring malformed {USER_ID_HEADER} header");
                None
            }
        },
        None => None,
    };

    let role = match req
        .headers()
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some("admin") => Role::Admin,
        Some("service") => Role::Service,
        _ => Role::User,
    };

    req.extensions_mut().insert(Principal { user_id, role });
    next.run(req).await
}
