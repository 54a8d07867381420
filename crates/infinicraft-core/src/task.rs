//! Service calls requested by the session and their completions.
//!
//! The session never awaits anything itself. It queues [`Task`]s; whoever
//! drives it runs them against a [`CraftService`] and hands each resulting
//! [`Completion`] back on the session's own thread.

use crate::combine::AttemptId;
use crate::element::Element;
use crate::profile::UserId;
use crate::service::{BoxFuture, CombineRequest, CombineResponse, CraftService, Progress, ServiceError, ServiceResult};
use std::sync::Arc;

/// A service call to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    LoadBase,
    LoadDiscovered { user: UserId },
    LoadProgress { user: UserId },
    Reset { user: UserId },
    Combine { attempt: AttemptId, request: CombineRequest },
}

/// The outcome of a [`Task`].
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    BaseLoaded(ServiceResult<Vec<Element>>),
    DiscoveredLoaded {
        user: UserId,
        result: ServiceResult<Vec<Element>>,
    },
    ProgressLoaded {
        user: UserId,
        result: ServiceResult<Progress>,
    },
    ResetFinished {
        user: UserId,
        result: ServiceResult<()>,
    },
    Combined {
        attempt: AttemptId,
        result: ServiceResult<CombineResponse>,
    },
}

impl Task {
    /// Run the call. The future resolves to exactly one completion.
    pub fn run(self, service: Arc<dyn CraftService>) -> BoxFuture<'static, Completion> {
        Box::pin(async move {
            match self {
                Task::LoadBase => Completion::BaseLoaded(service.base_elements().await),
                Task::LoadDiscovered { user } => {
                    let result = service.discovered_elements(&user).await;
                    Completion::DiscoveredLoaded { user, result }
                }
                Task::LoadProgress { user } => {
                    let result = service.progress(&user).await;
                    Completion::ProgressLoaded { user, result }
                }
                Task::Reset { user } => {
                    let result = service.reset(&user).await;
                    Completion::ResetFinished { user, result }
                }
                Task::Combine { attempt, request } => Completion::Combined {
                    attempt,
                    result: service.combine(&request).await,
                },
            }
        })
    }

    /// The completion this task would produce had the call failed with
    /// `error`. Used when the call never got to resolve.
    pub fn fail(self, error: ServiceError) -> Completion {
        match self {
            Task::LoadBase => Completion::BaseLoaded(Err(error)),
            Task::LoadDiscovered { user } => Completion::DiscoveredLoaded { user, result: Err(error) },
            Task::LoadProgress { user } => Completion::ProgressLoaded { user, result: Err(error) },
            Task::Reset { user } => Completion::ResetFinished { user, result: Err(error) },
            Task::Combine { attempt, .. } => Completion::Combined { attempt, result: Err(error) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_keeps_task_identity() {
        let error = ServiceError::Internal("boom".into());
        let user = UserId::from("alice");

        assert_eq!(Task::LoadBase.fail(error.clone()), Completion::BaseLoaded(Err(error.clone())));
        assert_eq!(
            Task::Reset { user: user.clone() }.fail(error.clone()),
            Completion::ResetFinished { user: user.clone(), result: Err(error.clone()) }
        );
        assert_eq!(
            Task::LoadProgress { user: user.clone() }.fail(error.clone()),
            Completion::ProgressLoaded { user, result: Err(error) }
        );
    }
}
