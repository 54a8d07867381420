//! Infinicraft Core Library
//!
//! Platform-agnostic state for the element-crafting client: the catalog of
//! known elements, the workspace canvas, the drag controller and the
//! combination workflow that ties them to the remote service.

pub mod catalog;
pub mod combine;
pub mod config;
pub mod drag;
pub mod element;
pub mod feedback;
pub mod input;
pub mod profile;
pub mod service;
pub mod session;
pub mod task;
pub mod workspace;

pub use catalog::Catalog;
pub use combine::{AttemptId, CombineAttempt, Orchestrator, Resolution};
pub use config::{ClientConfig, ConfigError, StaleResponses};
pub use drag::{CombineIntent, Drag, DragController, DragOrigin, DragState, DropOutcome, DropTarget};
pub use element::{Element, ElementId};
pub use feedback::{Feedback, FeedbackOutcome, FeedbackSlot};
pub use input::{PointerEvent, PointerSource, PressTarget};
pub use profile::{ProfileError, ProfileStore, UserId, DEFAULT_USER_ID};
pub use service::{CombineRequest, CombineResponse, CraftService, MemoryCraftService, Progress, ServiceError, ServiceResult};
pub use session::Session;
pub use task::{Completion, Task};
pub use workspace::{InstanceId, Workspace, WorkspaceInstance};
