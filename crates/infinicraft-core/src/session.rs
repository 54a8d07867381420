//! Session: the single owned container for all client state.
//!
//! Gestures are handled synchronously. Service calls are queued as
//! [`Task`]s and their [`Completion`]s are applied through [`Session::apply`],
//! so every mutation happens on whichever thread owns the session.

use crate::catalog::Catalog;
use crate::combine::{AttemptId, Orchestrator, Resolution};
use crate::config::ClientConfig;
use crate::drag::{Drag, DragController, DragOrigin, DragState, DropOutcome, DropTarget};
use crate::element::{Element, ElementId};
use crate::feedback::{Feedback, FeedbackSlot};
use crate::input::{PointerEvent, PointerSource, PressTarget};
use crate::profile::{ProfileResult, ProfileStore, UserId};
use crate::service::{CombineResponse, ServiceResult};
use crate::task::{Completion, Task};
use crate::workspace::{scatter_point, InstanceId, Workspace};
use kurbo::{Point, Rect};
use std::time::Instant;

/// Client state for one user.
#[derive(Debug)]
pub struct Session {
    user: UserId,
    config: ClientConfig,
    /// Canvas rectangle in client coordinates.
    canvas: Rect,
    catalog: Catalog,
    workspace: Workspace,
    drag: DragController,
    orchestrator: Orchestrator,
    feedback: FeedbackSlot,
    tasks: Vec<Task>,
    scatter_seed: u32,
}

impl Session {
    /// Create a session. Nothing is loaded until [`Session::start`].
    pub fn new(user: UserId, config: ClientConfig) -> Self {
        Self {
            user,
            canvas: Rect::from_origin_size(Point::ZERO, config.canvas),
            catalog: Catalog::new(),
            workspace: Workspace::new(),
            drag: DragController::new(config.touch_offset),
            orchestrator: Orchestrator::new(config.rollback_offset, config.stale_responses),
            feedback: FeedbackSlot::new(config.feedback_duration()),
            tasks: Vec::new(),
            scatter_seed: 0,
            config,
        }
    }

    /// Queue the initial catalog and progress loads.
    pub fn start(&mut self) {
        log::info!("Starting session for {}", self.user);
        self.tasks.push(Task::LoadBase);
        self.queue_refresh();
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    /// Move or resize the canvas (client coordinates).
    pub fn set_canvas(&mut self, canvas: Rect) {
        self.canvas = canvas;
    }

    /// Number of combination attempts awaiting a response.
    pub fn attempts_in_flight(&self) -> usize {
        self.orchestrator.in_flight()
    }

    /// Feedback visible at `now`.
    pub fn feedback(&self, now: Instant) -> Option<&Feedback> {
        self.feedback.current(now)
    }

    /// When the visible feedback should be cleared.
    pub fn feedback_deadline(&self) -> Option<Instant> {
        self.feedback.deadline()
    }

    /// Save a new username and reload everything for it.
    pub fn set_user(&mut self, store: &dyn ProfileStore, username: &str) -> ProfileResult<&UserId> {
        store.save_username(username)?;
        self.user = UserId::resolve(Some(username));
        self.start();
        Ok(&self.user)
    }

    // --- Gestures ---

    /// Press on a catalog entry.
    pub fn pointer_down_catalog(&mut self, element: &ElementId, pointer: Point, bounds: Rect, source: PointerSource) -> bool {
        let Some(element) = self.catalog.find(element).cloned() else {
            log::debug!("Press on unknown catalog element {}", element);
            return false;
        };
        self.drag.begin_from_catalog(element, pointer, bounds, source, self.canvas.origin())
    }

    /// Press on a workspace instance.
    pub fn pointer_down_instance(&mut self, instance: InstanceId, pointer: Point, bounds: Rect, source: PointerSource) -> bool {
        self.drag.begin_from_workspace(&mut self.workspace, instance, pointer, bounds, source)
    }

    pub fn pointer_move(&mut self, pointer: Point) {
        self.drag.pointer_move(pointer, self.canvas.origin());
    }

    /// Release the pointer. Drops onto another instance start a combination
    /// attempt; the drag is over either way.
    pub fn pointer_up(&mut self, pointer: Point) -> DropOutcome {
        if !self.drag.is_dragging() {
            return DropOutcome::Ignored;
        }
        let target = self.drop_target(pointer);
        let outcome = self.drag.release(&mut self.workspace, target);
        if let DropOutcome::Combine(intent) = &outcome {
            let attempt = self.orchestrator.begin(intent.clone(), self.workspace.epoch());
            let task = Task::Combine {
                attempt: attempt.id,
                request: attempt.request(&self.user),
            };
            self.tasks.push(task);
        }
        outcome
    }

    /// Abort the gesture as if released outside the canvas.
    pub fn pointer_cancel(&mut self) -> DropOutcome {
        self.drag.cancel(&mut self.workspace)
    }

    /// Dispatch a raw pointer event.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> Option<DropOutcome> {
        match event {
            PointerEvent::Down { position, source, target } => {
                match target {
                    PressTarget::Catalog { element, bounds } => {
                        self.pointer_down_catalog(&element, position, bounds, source);
                    }
                    PressTarget::Workspace { instance, bounds } => {
                        self.pointer_down_instance(instance, position, bounds, source);
                    }
                    PressTarget::Empty => {}
                }
                None
            }
            PointerEvent::Move { position } => {
                self.pointer_move(position);
                None
            }
            PointerEvent::Up { position } => Some(self.pointer_up(position)),
            PointerEvent::Cancel => Some(self.pointer_cancel()),
        }
    }

    /// Resolve what lies under a release point.
    pub fn drop_target(&self, pointer: Point) -> DropTarget {
        if !self.canvas.contains(pointer) {
            return DropTarget::Outside;
        }
        let local = pointer - self.canvas.origin().to_vec2();
        let size = self.config.element_size;
        if let Some(id) = self.workspace.instance_at(local, size) {
            return DropTarget::Instance(id);
        }
        // The dragged instance is out of the workspace while it moves, so its
        // original footprint is checked separately.
        if let DragState::Dragging(Drag {
            instance,
            origin: DragOrigin::Workspace { position, .. },
            ..
        }) = self.drag.state()
        {
            if Rect::from_origin_size(*position, size).contains(local) {
                return DropTarget::Instance(instance.instance_id);
            }
        }
        DropTarget::Canvas
    }

    // --- Workspace commands ---

    /// Click-to-add: place a catalog element somewhere inside the canvas.
    pub fn add_to_workspace(&mut self, element: &ElementId) -> Option<InstanceId> {
        let element: Element = self.catalog.find(element)?.clone();
        self.scatter_seed = self.scatter_seed.wrapping_add(1);
        let position = scatter_point(self.canvas.size(), self.scatter_seed);
        Some(self.workspace.place(element, position))
    }

    pub fn clear_workspace(&mut self) {
        log::info!("Clearing workspace ({} instances)", self.workspace.len());
        self.workspace.clear();
    }

    /// Ask the service to reset this user's discoveries. The workspace is
    /// only cleared once the reset succeeds.
    pub fn reset_progress(&mut self) {
        self.tasks.push(Task::Reset {
            user: self.user.clone(),
        });
    }

    // --- Service plumbing ---

    /// Take the queued service calls.
    pub fn take_tasks(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.tasks)
    }

    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Apply a finished service call.
    pub fn apply(&mut self, completion: Completion, now: Instant) -> Option<Resolution> {
        match completion {
            Completion::BaseLoaded(result) => self.catalog.apply_base(result),
            Completion::DiscoveredLoaded { user, result } => {
                if self.is_current(&user) {
                    self.catalog.apply_discovered(result);
                }
            }
            Completion::ProgressLoaded { user, result } => {
                if self.is_current(&user) {
                    self.catalog.apply_progress(result);
                }
            }
            Completion::ResetFinished { user, result } => match result {
                Ok(()) if self.is_current(&user) => {
                    log::info!("Progress reset for {}", user);
                    self.tasks.push(Task::LoadBase);
                    self.queue_refresh();
                    self.workspace.clear();
                }
                Ok(()) => {}
                Err(e) => log::warn!("Error resetting progress: {}", e),
            },
            Completion::Combined { attempt, result } => {
                let resolution = self.resolve_attempt(attempt, result, now);
                return Some(resolution);
            }
        }
        None
    }

    /// Clear expired feedback. Returns true if something was cleared.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.feedback.tick(now)
    }

    fn resolve_attempt(
        &mut self,
        attempt: AttemptId,
        result: ServiceResult<CombineResponse>,
        now: Instant,
    ) -> Resolution {
        let resolution = self
            .orchestrator
            .resolve(attempt, result, &mut self.workspace, &mut self.feedback, now);
        if let Resolution::Combined { .. } = resolution {
            self.queue_refresh();
        }
        resolution
    }

    fn queue_refresh(&mut self) {
        self.tasks.push(Task::LoadDiscovered {
            user: self.user.clone(),
        });
        self.tasks.push(Task::LoadProgress {
            user: self.user.clone(),
        });
    }

    fn is_current(&self, user: &UserId) -> bool {
        if user != &self.user {
            log::debug!("Ignoring response for previous user {}", user);
            return false;
        }
        true
    }
}
