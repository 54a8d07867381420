//! In-memory combination service.
//!
//! Holds the whole game (elements, recipes, per-user discoveries) behind a
//! lock. Used by tests and as the backend of the reference server.

use super::recipe::{parse_label, Recipe, RecipeError, STARTER_BASE};
use super::{BoxFuture, CombineRequest, CombineResponse, CraftService, Progress, ServiceError, ServiceResult};
use crate::element::{Element, ElementId};
use crate::profile::UserId;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

pub const CANNOT_COMBINE: &str = "These elements cannot be combined";
pub const NEW_DISCOVERY: &str = "New element discovered!";
pub const ALREADY_DISCOVERED: &str = "Element already discovered";

#[derive(Debug, Default)]
struct GameState {
    /// Every known element, base ones included.
    elements: Vec<Element>,
    base: Vec<ElementId>,
    /// Keyed by the ordered pair, so lookups are symmetric.
    recipes: HashMap<(ElementId, ElementId), ElementId>,
    discoveries: HashMap<UserId, Vec<ElementId>>,
}

impl GameState {
    fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    fn find_or_create(&mut self, name: &str, emoji: &str) -> ElementId {
        if let Some(existing) = self.elements.iter().find(|e| e.name == name && e.emoji == emoji) {
            return existing.id.clone();
        }
        let element = Element::new(Uuid::new_v4().to_string(), name, emoji);
        let id = element.id.clone();
        self.elements.push(element);
        id
    }

    fn discoveries_mut(&mut self, user: &UserId) -> &mut Vec<ElementId> {
        let base = &self.base;
        self.discoveries.entry(user.clone()).or_insert_with(|| base.clone())
    }

    fn add_recipe(&mut self, a: ElementId, b: ElementId, result: ElementId) {
        self.recipes.insert(recipe_key(a, b), result);
    }
}

fn recipe_key(a: ElementId, b: ElementId) -> (ElementId, ElementId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Saturates instead of wrapping for counts past `u32::MAX`.
fn discovery_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// In-memory game backend.
#[derive(Debug, Default)]
pub struct MemoryCraftService {
    state: RwLock<GameState>,
}

impl MemoryCraftService {
    /// A game with the starter base elements and recipes.
    pub fn new() -> Self {
        Self::from_recipes(&Recipe::starter()).unwrap_or_default()
    }

    /// The starter base elements plus the given recipes.
    pub fn from_recipes(recipes: &[Recipe]) -> Result<Self, RecipeError> {
        let service = Self::default();
        {
            let mut state = service.state.write().unwrap_or_else(|e| e.into_inner());
            for (name, emoji) in STARTER_BASE {
                let id = state.find_or_create(name, emoji);
                state.base.push(id);
            }
        }
        for recipe in recipes {
            service.add_recipe_labels(recipe)?;
        }
        log::info!("Loaded {} recipes", recipes.len());
        Ok(service)
    }

    /// A game with exactly these base elements and no recipes.
    pub fn with_base(base: Vec<Element>) -> Self {
        let state = GameState {
            base: base.iter().map(|e| e.id.clone()).collect(),
            elements: base,
            ..GameState::default()
        };
        Self {
            state: RwLock::new(state),
        }
    }

    /// Register a recipe between existing elements; the result element is
    /// added to the catalog if it is new.
    pub fn add_recipe(&self, a: &ElementId, b: &ElementId, result: Element) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let result_id = result.id.clone();
        if state.element(&result_id).is_none() {
            state.elements.push(result);
        }
        state.add_recipe(a.clone(), b.clone(), result_id);
    }

    /// Register a recipe written with labels, creating elements by
    /// (name, emoji) as needed.
    pub fn add_recipe_labels(&self, recipe: &Recipe) -> Result<(), RecipeError> {
        let (emoji1, name1) = parse_label(&recipe.element1)?;
        let (emoji2, name2) = parse_label(&recipe.element2)?;
        let (emoji_r, name_r) = parse_label(&recipe.result)?;

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let a = state.find_or_create(name1, emoji1);
        let b = state.find_or_create(name2, emoji2);
        let result = state.find_or_create(name_r, emoji_r);
        state.add_recipe(a, b, result);
        Ok(())
    }

    /// Every known element, base and crafted.
    pub fn all_elements(&self) -> ServiceResult<Vec<Element>> {
        Ok(self.read()?.elements.clone())
    }

    /// Look an element up by name.
    pub fn element_named(&self, name: &str) -> Option<Element> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.elements.iter().find(|e| e.name == name).cloned()
    }

    fn read(&self) -> ServiceResult<RwLockReadGuard<'_, GameState>> {
        self.state
            .read()
            .map_err(|e| ServiceError::Internal(format!("Lock error: {}", e)))
    }

    fn write(&self) -> ServiceResult<RwLockWriteGuard<'_, GameState>> {
        self.state
            .write()
            .map_err(|e| ServiceError::Internal(format!("Lock error: {}", e)))
    }
}

impl CraftService for MemoryCraftService {
    fn base_elements(&self) -> BoxFuture<'_, ServiceResult<Vec<Element>>> {
        Box::pin(async move {
            let state = self.read()?;
            Ok(state.base.iter().filter_map(|id| state.element(id).cloned()).collect())
        })
    }

    fn discovered_elements(&self, user: &UserId) -> BoxFuture<'_, ServiceResult<Vec<Element>>> {
        let user = user.clone();
        Box::pin(async move {
            let mut state = self.write()?;
            let ids = state.discoveries_mut(&user).clone();
            Ok(ids.iter().filter_map(|id| state.element(id).cloned()).collect())
        })
    }

    fn progress(&self, user: &UserId) -> BoxFuture<'_, ServiceResult<Progress>> {
        let user = user.clone();
        Box::pin(async move {
            let mut state = self.write()?;
            let discovered = state.discoveries_mut(&user).clone();
            Ok(Progress {
                user_id: user,
                discovery_count: discovery_count(discovered.len()),
                discovered_elements: discovered,
            })
        })
    }

    fn reset(&self, user: &UserId) -> BoxFuture<'_, ServiceResult<()>> {
        let user = user.clone();
        Box::pin(async move {
            let mut state = self.write()?;
            let base = state.base.clone();
            state.discoveries.insert(user, base);
            Ok(())
        })
    }

    fn combine(&self, request: &CombineRequest) -> BoxFuture<'_, ServiceResult<CombineResponse>> {
        let request = request.clone();
        Box::pin(async move {
            let mut state = self.write()?;
            for id in [&request.element1_id, &request.element2_id] {
                if state.element(id).is_none() {
                    return Err(ServiceError::NotFound(format!("Element {}", id)));
                }
            }

            let key = recipe_key(request.element1_id.clone(), request.element2_id.clone());
            let Some(result_id) = state.recipes.get(&key).cloned() else {
                return Ok(CombineResponse::rejected(CANNOT_COMBINE));
            };
            let result = state
                .element(&result_id)
                .cloned()
                .ok_or_else(|| ServiceError::Internal("Result element not found".to_string()))?;

            let discovered = state.discoveries_mut(&request.user_id);
            let is_new = !discovered.contains(&result.id);
            if is_new {
                discovered.push(result.id.clone());
            }
            Ok(CombineResponse::combined(
                result,
                if is_new { NEW_DISCOVERY } else { ALREADY_DISCOVERED },
            ))
        })
    }
}
