//! Combination orchestrator.
//!
//! Every drop of one instance onto another becomes exactly one
//! [`CombineAttempt`] and one request. When the response arrives the
//! workspace is reconciled against whatever it holds at that moment:
//!
//! - success: the target is replaced by the result at the target's position
//! - rejection: the source comes back left of the target, with a message
//! - transport error: same rollback as a rejection, without a message

use crate::config::StaleResponses;
use crate::drag::CombineIntent;
use crate::feedback::{FeedbackOutcome, FeedbackSlot};
use crate::profile::UserId;
use crate::service::{CombineRequest, CombineResponse, ServiceResult};
use crate::workspace::{InstanceId, Workspace, WorkspaceInstance};
use kurbo::Point;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

/// Identifies one combination attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

/// A combination request waiting for its response.
#[derive(Debug, Clone, PartialEq)]
pub struct CombineAttempt {
    pub id: AttemptId,
    /// The dragged instance; held here, not in the workspace.
    pub source: WorkspaceInstance,
    /// Snapshot of the target at drop time.
    pub target: WorkspaceInstance,
    /// Workspace epoch when the attempt started.
    pub epoch: u64,
}

impl CombineAttempt {
    pub fn request(&self, user: &UserId) -> CombineRequest {
        CombineRequest {
            element1_id: self.source.element.id.clone(),
            element2_id: self.target.element.id.clone(),
            user_id: user.clone(),
        }
    }
}

/// How a completed attempt changed the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Target replaced by `result`.
    Combined { result: InstanceId },
    /// Service refused; source restored as `restored`.
    Rejected { restored: InstanceId },
    /// Request failed; source restored as `restored`.
    Failed { restored: InstanceId },
    /// Dropped because the workspace was cleared meanwhile.
    Stale,
    /// No such attempt in flight.
    Unknown,
}

/// Tracks in-flight attempts and applies their outcomes.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    next_id: u64,
    in_flight: HashMap<AttemptId, CombineAttempt>,
    rollback_offset: f64,
    stale_responses: StaleResponses,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(60.0, StaleResponses::Apply)
    }
}

impl Orchestrator {
    pub fn new(rollback_offset: f64, stale_responses: StaleResponses) -> Self {
        Self {
            next_id: 1,
            in_flight: HashMap::new(),
            rollback_offset,
            stale_responses,
        }
    }

    /// Register an attempt for a drop intent.
    pub fn begin(&mut self, intent: CombineIntent, epoch: u64) -> &CombineAttempt {
        let id = AttemptId(self.next_id);
        self.next_id += 1;
        log::info!(
            "Combining {} with {} ({})",
            intent.source.element.name,
            intent.target.element.name,
            id
        );
        self.in_flight.entry(id).or_insert(CombineAttempt {
            id,
            source: intent.source,
            target: intent.target,
            epoch,
        })
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn attempt(&self, id: AttemptId) -> Option<&CombineAttempt> {
        self.in_flight.get(&id)
    }

    /// Apply the response to an attempt.
    pub fn resolve(
        &mut self,
        id: AttemptId,
        response: ServiceResult<CombineResponse>,
        workspace: &mut Workspace,
        feedback: &mut FeedbackSlot,
        now: Instant,
    ) -> Resolution {
        let Some(attempt) = self.in_flight.remove(&id) else {
            log::warn!("Ignoring response for unknown {}", id);
            return Resolution::Unknown;
        };
        if self.stale_responses == StaleResponses::Discard && attempt.epoch != workspace.epoch() {
            log::info!("Discarding stale response for {}", id);
            return Resolution::Stale;
        }

        let anchor = attempt.target.position;
        match response {
            Ok(CombineResponse {
                success: true,
                result: Some(result),
                ..
            }) => {
                log::info!("{} produced {}", id, result.name);
                workspace.remove(attempt.target.instance_id);
                let instance = workspace.place(result.clone(), anchor);
                feedback.show(FeedbackOutcome::Success(result), anchor, now);
                Resolution::Combined { result: instance }
            }
            Ok(CombineResponse {
                success: false,
                message,
                ..
            }) => {
                log::info!("{} rejected: {}", id, message);
                feedback.show(FeedbackOutcome::Failure(message), anchor, now);
                Resolution::Rejected {
                    restored: self.restore_source(&attempt, workspace),
                }
            }
            Ok(CombineResponse { success: true, result: None, .. }) => {
                log::warn!("{} reported success without a result", id);
                Resolution::Failed {
                    restored: self.restore_source(&attempt, workspace),
                }
            }
            Err(e) => {
                log::warn!("Error combining elements for {}: {}", id, e);
                Resolution::Failed {
                    restored: self.restore_source(&attempt, workspace),
                }
            }
        }
    }

    /// Put the source element back just left of the target.
    fn restore_source(&self, attempt: &CombineAttempt, workspace: &mut Workspace) -> InstanceId {
        let position = Point::new(attempt.target.position.x - self.rollback_offset, attempt.target.position.y);
        let restored = attempt.source.respawn(position);
        let id = restored.instance_id;
        workspace.insert(restored);
        id
    }
}
