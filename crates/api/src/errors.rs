//! Error → HTTP response mapping.
//!
//! Every denial and validation failure passes through [`classify`], so the
//! not-found/forbidden split is applied the same way for every operation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use forgetrack_auth::{AuthError, AuthzError};
use forgetrack_gateway::GatewayError;
use forgetrack_workflow::WorkflowError;

/// Status code and machine-readable error code for `err`.
pub fn classify(err: &GatewayError) -> (StatusCode, &'static str) {
    match err {
        GatewayError::Authz(AuthzError::NotFound) => (StatusCode::NOT_FOUND, "not_found"),
        GatewayError::Authz(AuthzError::Forbidden { .. }) => (StatusCode::FORBIDDEN, "forbidden"),
        GatewayError::Authz(AuthzError::InsufficientRole { .. }) => {
            (StatusCode::FORBIDDEN, "insufficient_role")
        }
        GatewayError::Workflow(WorkflowError::InvalidStatus { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_status")
        }
        GatewayError::Workflow(WorkflowError::IncompatibleStatus { .. }) => {
            (StatusCode::BAD_REQUEST, "incompatible_status")
        }
        GatewayError::Workflow(WorkflowError::DefaultWorkflowExists(_)) => {
            (StatusCode::CONFLICT, "already_exists")
        }
        GatewayError::Workflow(WorkflowError::Validation(_)) => {
            (StatusCode::BAD_REQUEST, "validation_error")
        }
        GatewayError::Workflow(WorkflowError::NotFound) => (StatusCode::NOT_FOUND, "not_found"),
        GatewayError::Workflow(WorkflowError::Storage(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "store_error")
        }
        GatewayError::RoleAssignment(_) => (StatusCode::FORBIDDEN, "forbidden"),
        GatewayError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        GatewayError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        GatewayError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
    }
}

pub fn gateway_error_to_response(err: GatewayError) -> Response {
    let (status, code) = classify(&err);
    let message = match &err {
        GatewayError::Authz(AuthzError::NotFound) | GatewayError::Workflow(WorkflowError::NotFound) => {
            "not found".to_string()
        }
        GatewayError::Authz(AuthzError::Forbidden { message, .. }) => message.clone(),
        other => other.to_string(),
    };
    json_error(status, code, message)
}

pub fn auth_error_to_response(err: AuthError) -> Response {
    match err {
        AuthError::Storage(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg),
        other => json_error(StatusCode::UNAUTHORIZED, "unauthorized", other.to_string()),
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgetrack_auth::{DenialKind, Operation, Role};
    use forgetrack_core::OrganizationId;
    use forgetrack_workflow::StatusLabel;

    #[test]
    fn concealment_and_denials_map_apart() {
        assert_eq!(
            classify(&GatewayError::not_found()),
            (StatusCode::NOT_FOUND, "not_found")
        );
        assert_eq!(
            classify(&GatewayError::Authz(AuthzError::Forbidden {
                reason: DenialKind::TenantMismatch,
                message: "this ticket belongs to another organization".to_string(),
            })),
            (StatusCode::FORBIDDEN, "forbidden")
        );
        assert_eq!(
            classify(&GatewayError::Authz(AuthzError::InsufficientRole {
                role: Role::ReadAccess,
                operation: Operation::TicketDelete,
            })),
            (StatusCode::FORBIDDEN, "insufficient_role")
        );
    }

    #[test]
    fn workflow_failures() {
        let allowed = vec![StatusLabel::parse("TODO").unwrap()];
        assert_eq!(
            classify(&GatewayError::Workflow(WorkflowError::InvalidStatus {
                status: "NOPE".to_string(),
                allowed: allowed.clone(),
            }))
            .0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            classify(&GatewayError::Workflow(WorkflowError::IncompatibleStatus {
                status: StatusLabel::parse("DONE").unwrap(),
                allowed,
            }))
            .0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            classify(&GatewayError::Workflow(WorkflowError::DefaultWorkflowExists(
                OrganizationId::new()
            ))),
            (StatusCode::CONFLICT, "already_exists")
        );
    }

    #[test]
    fn auth_failures_are_unauthorized() {
        let response = auth_error_to_response(AuthError::Inactive);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = auth_error_to_response(AuthError::Storage("down".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_response_hides_detail() {
        let response = gateway_error_to_response(GatewayError::not_found());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
