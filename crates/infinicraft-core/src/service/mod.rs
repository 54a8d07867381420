//! Boundary to the remote combination service.

mod memory;
mod recipe;

pub use memory::{MemoryCraftService, ALREADY_DISCOVERED, CANNOT_COMBINE, NEW_DISCOVERY};
pub use recipe::{parse_label, Recipe, RecipeError, STARTER_BASE, STARTER_RECIPES};

use crate::element::{Element, ElementId};
use crate::profile::UserId;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Service errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The request could not be sent or completed.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Service error: {0}")]
    Internal(String),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Boxed future for service calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Body of a combine request. Element order is source, then target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombineRequest {
    pub element1_id: ElementId,
    pub element2_id: ElementId,
    pub user_id: UserId,
}

/// Answer to a combine request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombineResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Element>,
    #[serde(default)]
    pub message: String,
}

impl CombineResponse {
    pub fn combined(result: Element, message: impl Into<String>) -> Self {
        Self {
            success: true,
            result: Some(result),
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            message: message.into(),
        }
    }
}

/// A user's progress as reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub user_id: UserId,
    pub discovery_count: u32,
    #[serde(default)]
    pub discovered_elements: Vec<ElementId>,
}

/// Trait for combination service backends.
///
/// Implementations may talk to a remote server or keep the whole game in
/// memory. Every call is independent; callers never cancel them.
pub trait CraftService: Send + Sync {
    /// The fixed set of base elements.
    fn base_elements(&self) -> BoxFuture<'_, ServiceResult<Vec<Element>>>;

    /// Every element the user has unlocked, base elements included.
    fn discovered_elements(&self, user: &UserId) -> BoxFuture<'_, ServiceResult<Vec<Element>>>;

    /// The user's discovery counter.
    fn progress(&self, user: &UserId) -> BoxFuture<'_, ServiceResult<Progress>>;

    /// Reset the user's discoveries to the base set. Idempotent.
    fn reset(&self, user: &UserId) -> BoxFuture<'_, ServiceResult<()>>;

    /// Try to combine two elements.
    fn combine(&self, request: &CombineRequest) -> BoxFuture<'_, ServiceResult<CombineResponse>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_parses_without_result() {
        let response: CombineResponse =
            serde_json::from_str(r#"{"success": false, "message": "These elements cannot be combined"}"#).unwrap();
        assert!(!response.success);
        assert!(response.result.is_none());
    }

    #[test]
    fn test_combine_request_wire_shape() {
        let request = CombineRequest {
            element1_id: "1".into(),
            element2_id: "2".into(),
            user_id: "alice".into(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"element1_id": "1", "element2_id": "2", "user_id": "alice"})
        );
    }
}
