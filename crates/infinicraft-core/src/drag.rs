//! Drag controller: turns pointer gestures into placement, reordering and
//! combination intents.
//!
//! Gesture handling is fully synchronous. A drop on another instance only
//! yields a [`CombineIntent`]; the controller is back to [`DragState::Idle`]
//! before any request is issued.

use crate::element::Element;
use crate::input::PointerSource;
use crate::workspace::{InstanceId, Workspace, WorkspaceInstance};
use kurbo::{Point, Rect, Vec2};

/// Where the dragged instance came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOrigin {
    /// Pulled out of the element catalog.
    Catalog,
    /// Picked up from the workspace at `index`, originally at `position`.
    Workspace { index: usize, position: Point },
}

/// An active drag gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct Drag {
    /// The instance being dragged; its position tracks the pointer.
    pub instance: WorkspaceInstance,
    /// Pointer offset from the instance's top-left corner.
    pub offset: Vec2,
    pub origin: DragOrigin,
}

/// Drag state. At most one gesture exists at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(Drag),
}

/// Resolved location of a pointer release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Empty canvas area.
    Canvas,
    /// Over a workspace instance.
    Instance(InstanceId),
    /// Outside the canvas bounds.
    Outside,
}

/// Request to combine two instances.
///
/// `source` is no longer in the workspace; `target` still is.
#[derive(Debug, Clone, PartialEq)]
pub struct CombineIntent {
    pub source: WorkspaceInstance,
    pub target: WorkspaceInstance,
}

/// Result of releasing a drag.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Inserted on the canvas at the last pointer-tracked position.
    Placed(InstanceId),
    /// Dropped on itself and put back exactly where it was.
    Returned(InstanceId),
    /// Dropped on another instance.
    Combine(CombineIntent),
    /// Workspace instance released outside the canvas and reinserted.
    Reinserted(InstanceId),
    /// Catalog drag released outside the canvas.
    Discarded,
    /// No drag was active.
    Ignored,
}

/// Owns the single drag gesture.
#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    /// Fixed grab offset for touch input.
    touch_offset: Vec2,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(Vec2::new(30.0, 30.0))
    }
}

impl DragController {
    pub fn new(touch_offset: Vec2) -> Self {
        Self {
            state: DragState::Idle,
            touch_offset,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// The instance under the pointer, if a drag is active.
    pub fn dragged(&self) -> Option<&WorkspaceInstance> {
        match &self.state {
            DragState::Dragging(drag) => Some(&drag.instance),
            DragState::Idle => None,
        }
    }

    /// Start dragging a fresh instance of a catalog element.
    ///
    /// Returns false if a drag is already active.
    pub fn begin_from_catalog(
        &mut self,
        element: Element,
        pointer: Point,
        bounds: Rect,
        source: PointerSource,
        container: Point,
    ) -> bool {
        if self.is_dragging() {
            log::debug!("Ignoring catalog press for {} during an active drag", element.name);
            return false;
        }

        let offset = source.grab_offset(pointer, bounds, self.touch_offset);
        let position = tracked_position(pointer, container, offset);
        log::debug!("Started dragging {} from the catalog", element.name);
        self.state = DragState::Dragging(Drag {
            instance: WorkspaceInstance::new(element, position),
            offset,
            origin: DragOrigin::Catalog,
        });
        true
    }

    /// Pick up an instance already on the workspace.
    ///
    /// The instance leaves the workspace immediately so it is never painted
    /// twice nor hit-tested as its own drop target. Returns false if a drag
    /// is already active or the instance is unknown.
    pub fn begin_from_workspace(
        &mut self,
        workspace: &mut Workspace,
        id: InstanceId,
        pointer: Point,
        bounds: Rect,
        source: PointerSource,
    ) -> bool {
        if self.is_dragging() {
            log::debug!("Ignoring workspace press during an active drag");
            return false;
        }
        let Some(index) = workspace.index_of(id) else {
            return false;
        };
        let Some(instance) = workspace.remove(id) else {
            return false;
        };

        let offset = source.grab_offset(pointer, bounds, self.touch_offset);
        log::debug!("Started dragging {} from the workspace", instance.element.name);
        self.state = DragState::Dragging(Drag {
            origin: DragOrigin::Workspace {
                index,
                position: instance.position,
            },
            instance,
            offset,
        });
        true
    }

    /// Track the pointer. The position is not clamped to the canvas.
    pub fn pointer_move(&mut self, pointer: Point, container: Point) {
        if let DragState::Dragging(drag) = &mut self.state {
            drag.instance.position = tracked_position(pointer, container, drag.offset);
        }
    }

    /// Finish the gesture over `target`. Always leaves the controller idle.
    pub fn release(&mut self, workspace: &mut Workspace, target: DropTarget) -> DropOutcome {
        let DragState::Dragging(drag) = std::mem::take(&mut self.state) else {
            return DropOutcome::Ignored;
        };
        let Drag { mut instance, origin, .. } = drag;
        let id = instance.instance_id;

        match target {
            DropTarget::Instance(target_id) if target_id == id => match origin {
                DragOrigin::Workspace { index, position } => {
                    instance.position = position;
                    workspace.insert_at(index, instance);
                    DropOutcome::Returned(id)
                }
                DragOrigin::Catalog => {
                    workspace.insert(instance);
                    DropOutcome::Placed(id)
                }
            },
            DropTarget::Instance(target_id) => match workspace.get(target_id) {
                Some(target) => DropOutcome::Combine(CombineIntent {
                    source: instance,
                    target: target.clone(),
                }),
                None => {
                    workspace.insert(instance);
                    DropOutcome::Placed(id)
                }
            },
            DropTarget::Canvas => {
                workspace.insert(instance);
                DropOutcome::Placed(id)
            }
            DropTarget::Outside => match origin {
                DragOrigin::Workspace { .. } => {
                    workspace.insert(instance);
                    DropOutcome::Reinserted(id)
                }
                DragOrigin::Catalog => {
                    log::debug!("Discarded catalog drag of {}", instance.element.name);
                    DropOutcome::Discarded
                }
            },
        }
    }

    /// Abort the gesture as if released outside the canvas.
    pub fn cancel(&mut self, workspace: &mut Workspace) -> DropOutcome {
        self.release(workspace, DropTarget::Outside)
    }
}

fn tracked_position(pointer: Point, container: Point, offset: Vec2) -> Point {
    Point::new(pointer.x - container.x - offset.x, pointer.y - container.y - offset.y)
}
