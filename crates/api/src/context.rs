use axum::http::HeaderMap;
use uuid::Uuid;

use forgetrack_auth::{AuthError, Principal, PrincipalResolver};

/// Per-request context: who is acting, and a correlation id for logs.
///
/// Built fresh for every request; the principal is never cached between
/// requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: Uuid,
    principal: Principal,
}

impl RequestContext {
    pub fn new(principal: Principal) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            principal,
        }
    }

    /// Resolve the bearer credential in `headers`.
    pub fn from_headers<R>(resolver: &R, headers: &HeaderMap) -> Result<Self, AuthError>
    where
        R: PrincipalResolver + ?Sized,
    {
        let token = extract_bearer(headers)?;
        let principal = resolver.resolve_principal(token)?;
        let ctx = Self::new(principal);
        tracing::debug!(
            request_id = %ctx.request_id,
            principal_id = %ctx.principal.id,
            role = %ctx.principal.role,
            "request authenticated"
        );
        Ok(ctx)
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::InvalidCredential)?;

    let header = header.to_str().map_err(|_| AuthError::InvalidCredential)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidCredential)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidCredential);
    }

    Ok(token)
}
