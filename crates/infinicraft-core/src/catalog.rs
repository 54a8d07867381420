//! Element catalog: base elements, discovered elements and the discovery
//! counter, as last reported by the service.

use crate::element::{Element, ElementId};
use crate::service::{Progress, ServiceResult};

/// Snapshot of what the user can craft with.
///
/// A failed load never overwrites good data with nothing. The one exception
/// is the documented fallback: if discovered elements cannot be fetched and
/// base elements are already loaded, the base set stands in for them.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    base: Vec<Element>,
    discovered: Vec<Element>,
    discovery_count: u32,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base(&self) -> &[Element] {
        &self.base
    }

    pub fn discovered(&self) -> &[Element] {
        &self.discovered
    }

    pub fn discovery_count(&self) -> u32 {
        self.discovery_count
    }

    /// Elements to show in the catalog panel.
    pub fn elements(&self) -> &[Element] {
        if self.discovered.is_empty() {
            &self.base
        } else {
            &self.discovered
        }
    }

    /// Look an element up by id, discovered first.
    pub fn find(&self, id: &ElementId) -> Option<&Element> {
        self.discovered
            .iter()
            .chain(self.base.iter())
            .find(|e| &e.id == id)
    }

    /// Look an element up by name (case-insensitive), discovered first.
    pub fn find_by_name(&self, name: &str) -> Option<&Element> {
        self.discovered
            .iter()
            .chain(self.base.iter())
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Apply a base elements fetch.
    pub fn apply_base(&mut self, result: ServiceResult<Vec<Element>>) {
        match result {
            Ok(elements) => {
                log::debug!("Loaded {} base elements", elements.len());
                self.base = elements;
            }
            Err(e) => log::warn!("Error fetching base elements: {}", e),
        }
    }

    /// Apply a discovered elements fetch.
    pub fn apply_discovered(&mut self, result: ServiceResult<Vec<Element>>) {
        match result {
            Ok(elements) => {
                log::debug!("Loaded {} discovered elements", elements.len());
                self.discovered = elements;
            }
            Err(e) => {
                log::warn!("Error fetching discovered elements: {}", e);
                if !self.base.is_empty() {
                    log::info!("Falling back to base elements");
                    self.discovered = self.base.clone();
                }
            }
        }
    }

    /// Apply a progress fetch.
    pub fn apply_progress(&mut self, result: ServiceResult<Progress>) {
        match result {
            Ok(progress) => self.discovery_count = progress.discovery_count,
            Err(e) => log::warn!("Error fetching user progress: {}", e),
        }
    }
}
