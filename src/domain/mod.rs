//! Domain layer types and invariants.

pub mod allergies;
pub mod error;
pub mod session;

pub use brigade_api_types::{
    Allergy, AllergyLink, Equipment, EquipmentLink, Ingredient, IngredientLink, Menu, MenuItem,
    MenuSection, Recipe, RecipeIngredient, RestaurantId,
};
