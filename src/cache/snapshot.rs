//! Immutable per-restaurant snapshot committed by a successful batch load.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::{
    Allergy, Equipment, Ingredient, Menu, MenuItem, MenuSection, Recipe, RestaurantId,
};

/// All seven collections fetched together for one restaurant.
///
/// Allergies and equipment are global; the rest are owned by
/// `restaurant_id`. A snapshot is never mutated after commit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSnapshot {
    pub restaurant_id: RestaurantId,
    pub menu_items: Vec<MenuItem>,
    pub ingredients: Vec<Ingredient>,
    pub allergies: Vec<Allergy>,
    pub recipes: Vec<Recipe>,
    pub equipment: Vec<Equipment>,
    pub menu_sections: Vec<MenuSection>,
    pub menus: Vec<Menu>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

impl RestaurantSnapshot {
    pub fn empty(restaurant_id: RestaurantId) -> Self {
        Self {
            restaurant_id,
            menu_items: Vec::new(),
            ingredients: Vec::new(),
            allergies: Vec::new(),
            recipes: Vec::new(),
            equipment: Vec::new(),
            menu_sections: Vec::new(),
            menus: Vec::new(),
            last_updated: OffsetDateTime::now_utc(),
        }
    }

    pub fn counts(&self) -> SnapshotCounts {
        SnapshotCounts {
            menu_items: self.menu_items.len(),
            ingredients: self.ingredients.len(),
            allergies: self.allergies.len(),
            recipes: self.recipes.len(),
            equipment: self.equipment.len(),
            menu_sections: self.menu_sections.len(),
            menus: self.menus.len(),
        }
    }

    pub fn allergy(&self, id: &str) -> Option<&Allergy> {
        self.allergies.iter().find(|allergy| allergy.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCounts {
    pub menu_items: usize,
    pub ingredients: usize,
    pub allergies: usize,
    pub recipes: usize,
    pub equipment: usize,
    pub menu_sections: usize,
    pub menus: usize,
}
