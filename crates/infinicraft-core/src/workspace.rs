//! Workspace model: element instances placed on the canvas.

use crate::element::Element;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Client-generated identity of a single placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Generate a fresh, never reused instance id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "workspace-{}", self.0)
    }
}

/// A placed copy of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInstance {
    pub instance_id: InstanceId,
    pub element: Element,
    /// Top-left corner in workspace-local pixels.
    pub position: Point,
}

impl WorkspaceInstance {
    /// Create a new instance with a fresh id.
    pub fn new(element: Element, position: Point) -> Self {
        Self {
            instance_id: InstanceId::new(),
            element,
            position,
        }
    }

    /// Same element under a fresh instance id at another position.
    pub fn respawn(&self, position: Point) -> Self {
        Self::new(self.element.clone(), position)
    }

    /// Bounding box for an element box of the given size.
    pub fn bounds(&self, size: Size) -> Rect {
        Rect::from_origin_size(self.position, size)
    }
}

/// The set of instances on the canvas, in paint order (back to front).
///
/// Every operation is total: unknown ids are no-ops.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    instances: Vec<WorkspaceInstance>,
    /// Bumped on every clear.
    epoch: u64,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an element at a position, returning the new instance id.
    pub fn place(&mut self, element: Element, position: Point) -> InstanceId {
        let instance = WorkspaceInstance::new(element, position);
        let id = instance.instance_id;
        self.instances.push(instance);
        id
    }

    /// Append an existing instance on top.
    pub fn insert(&mut self, instance: WorkspaceInstance) {
        self.instances.push(instance);
    }

    /// Insert an instance at a paint-order index (clamped to the length).
    pub fn insert_at(&mut self, index: usize, instance: WorkspaceInstance) {
        let index = index.min(self.instances.len());
        self.instances.insert(index, instance);
    }

    /// Remove an instance by id.
    pub fn remove(&mut self, id: InstanceId) -> Option<WorkspaceInstance> {
        let index = self.index_of(id)?;
        Some(self.instances.remove(index))
    }

    /// Remove every instance.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.epoch += 1;
    }

    /// Instances in insertion order.
    pub fn list(&self) -> &[WorkspaceInstance] {
        &self.instances
    }

    pub fn get(&self, id: InstanceId) -> Option<&WorkspaceInstance> {
        self.instances.iter().find(|i| i.instance_id == id)
    }

    pub fn index_of(&self, id: InstanceId) -> Option<usize> {
        self.instances.iter().position(|i| i.instance_id == id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Number of clears since creation.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Topmost instance under a workspace-local point.
    pub fn instance_at(&self, point: Point, size: Size) -> Option<InstanceId> {
        self.instances
            .iter()
            .rev()
            .find(|i| i.bounds(size).contains(point))
            .map(|i| i.instance_id)
    }
}

/// Mix a counter into a well-distributed 32-bit value (splitmix32-like).
fn mix(counter: u32) -> u32 {
    let mut x = counter.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

/// Maps a hash onto `[0, 1)`.
fn unit_interval(v: u32) -> f64 {
    f64::from(v) / (f64::from(u32::MAX) + 1.0)
}

/// Pseudo-random drop point for click-to-add placement.
///
/// Keeps a 100px margin on the leading edges and 200px on the trailing
/// ones so the new instance lands well inside the canvas.
pub fn scatter_point(canvas: Size, seed: u32) -> Point {
    let span_x = (canvas.width - 300.0).max(0.0);
    let span_y = (canvas.height - 300.0).max(0.0);
    Point::new(
        100.0 + unit_interval(mix(seed.wrapping_mul(2))) * span_x,
        100.0 + unit_interval(mix(seed.wrapping_mul(2).wrapping_add(1))) * span_y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> Element {
        Element::new("1", "Water", "💧")
    }

    fn fire() -> Element {
        Element::new("2", "Fire", "🔥")
    }

    #[test]
    fn test_place_and_list_order() {
        let mut ws = Workspace::new();
        let a = ws.place(water(), Point::new(10.0, 10.0));
        let b = ws.place(water(), Point::new(50.0, 10.0));

        assert_ne!(a, b);
        assert_eq!(ws.len(), 2);
        assert_eq!(ws.list()[0].instance_id, a);
        assert_eq!(ws.list()[1].instance_id, b);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut ws = Workspace::new();
        ws.place(fire(), Point::ZERO);

        assert!(ws.remove(InstanceId::new()).is_none());
        assert_eq!(ws.len(), 1);
    }

    #[test]
    fn test_insert_at_clamps() {
        let mut ws = Workspace::new();
        ws.place(water(), Point::ZERO);
        let late = WorkspaceInstance::new(fire(), Point::ZERO);
        let id = late.instance_id;
        ws.insert_at(99, late);

        assert_eq!(ws.index_of(id), Some(1));
    }

    #[test]
    fn test_clear_bumps_epoch() {
        let mut ws = Workspace::new();
        ws.place(water(), Point::ZERO);
        assert_eq!(ws.epoch(), 0);

        ws.clear();
        assert!(ws.is_empty());
        assert_eq!(ws.epoch(), 1);
    }

    #[test]
    fn test_instance_at_prefers_topmost() {
        let mut ws = Workspace::new();
        let size = Size::new(100.0, 40.0);
        let bottom = ws.place(water(), Point::new(0.0, 0.0));
        let top = ws.place(fire(), Point::new(50.0, 0.0));

        assert_eq!(ws.instance_at(Point::new(75.0, 20.0), size), Some(top));
        assert_eq!(ws.instance_at(Point::new(25.0, 20.0), size), Some(bottom));
        assert_eq!(ws.instance_at(Point::new(500.0, 500.0), size), None);
    }

    #[test]
    fn test_respawn_keeps_element() {
        let original = WorkspaceInstance::new(water(), Point::new(5.0, 5.0));
        let copy = original.respawn(Point::new(1.0, 2.0));

        assert_ne!(copy.instance_id, original.instance_id);
        assert_eq!(copy.element, original.element);
        assert_eq!(copy.position, Point::new(1.0, 2.0));
    }

    #[test]
    fn test_scatter_point_stays_inside_margins() {
        let canvas = Size::new(800.0, 600.0);
        for seed in 0..200 {
            let p = scatter_point(canvas, seed);
            assert!(p.x >= 100.0 && p.x < 600.0, "x out of range: {}", p.x);
            assert!(p.y >= 100.0 && p.y < 400.0, "y out of range: {}", p.y);
        }
    }

    #[test]
    fn test_unit_interval_excludes_one() {
        assert_eq!(unit_interval(0), 0.0);
        assert!(unit_interval(u32::MAX) < 1.0);
        assert!(unit_interval(u32::MAX) > 0.999);
    }

    #[test]
    fn test_scatter_point_small_canvas() {
        let p = scatter_point(Size::new(200.0, 100.0), 7);
        assert_eq!(p, Point::new(100.0, 100.0));
    }
}
