//! Recipe definitions for the in-memory service.
//!
//! Recipes use display labels (`"💧 Water"`: emoji, a space, then the name)
//! so a recipe file can be written by hand.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base elements seeded into a fresh game, as (name, emoji).
pub const STARTER_BASE: &[(&str, &str)] = &[
    ("Water", "💧"),
    ("Fire", "🔥"),
    ("Wind", "💨"),
    ("Earth", "🌍"),
];

/// Recipes available without a recipe file, as (first, second, result) labels.
pub const STARTER_RECIPES: &[(&str, &str, &str)] = &[
    ("💧 Water", "🔥 Fire", "♨️ Steam"),
    ("🌍 Earth", "💧 Water", "🌱 Plant"),
    ("🔥 Fire", "🌍 Earth", "🌋 Lava"),
    ("💨 Wind", "🔥 Fire", "💨 Smoke"),
    ("💨 Wind", "🌍 Earth", "🌫️ Dust"),
    ("💧 Water", "💨 Wind", "🌊 Wave"),
    ("🌋 Lava", "💧 Water", "🪨 Stone"),
    ("🌱 Plant", "🌱 Plant", "🌳 Tree"),
    ("♨️ Steam", "💨 Wind", "☁️ Cloud"),
    ("☁️ Cloud", "💧 Water", "🌧️ Rain"),
];

/// Recipe errors.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Invalid element label {0:?}: expected \"<emoji> <name>\"")]
    InvalidLabel(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// One combination rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub element1: String,
    pub element2: String,
    pub result: String,
}

impl Recipe {
    pub fn new(element1: &str, element2: &str, result: &str) -> Self {
        Self {
            element1: element1.to_string(),
            element2: element2.to_string(),
            result: result.to_string(),
        }
    }

    /// The built-in recipe set.
    pub fn starter() -> Vec<Recipe> {
        STARTER_RECIPES
            .iter()
            .map(|(a, b, result)| Recipe::new(a, b, result))
            .collect()
    }

    /// Parse a JSON array of recipes.
    pub fn parse_list(json: &str) -> Result<Vec<Recipe>, RecipeError> {
        serde_json::from_str(json).map_err(|e| RecipeError::Parse(e.to_string()))
    }
}

/// Split a label into (emoji, name).
pub fn parse_label(label: &str) -> Result<(&str, &str), RecipeError> {
    let (emoji, name) = label
        .trim()
        .split_once(' ')
        .ok_or_else(|| RecipeError::InvalidLabel(label.to_string()))?;
    let name = name.trim();
    if emoji.is_empty() || name.is_empty() {
        return Err(RecipeError::InvalidLabel(label.to_string()));
    }
    Ok((emoji, name))
}
