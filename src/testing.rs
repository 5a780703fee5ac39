//! Fixtures and an in-memory data source shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::application::repos::{ListParams, RestaurantDataSource, SourceError};
use crate::domain::session::{SelectedRestaurant, SessionContext, UserSession};
use crate::domain::{
    Allergy, AllergyLink, Equipment, Ingredient, IngredientLink, Menu, MenuItem, MenuSection,
    Recipe, RecipeIngredient, RestaurantId,
};

pub fn ingredient(id: &str, restaurant: &str, name: &str) -> Ingredient {
    Ingredient {
        id: id.to_string(),
        restaurant_id: RestaurantId::new(restaurant),
        name: name.to_string(),
        description: None,
        ingredient_allergies: Vec::new(),
        categories: Vec::new(),
        sub_ingredients: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

pub fn with_allergies(mut ingredient: Ingredient, allergies: &[&str]) -> Ingredient {
    ingredient.ingredient_allergies = allergies
        .iter()
        .map(|id| AllergyLink {
            allergy_id: (*id).to_string(),
        })
        .collect();
    ingredient
}

pub fn menu_item(id: &str, restaurant: &str, name: &str, ingredients: &[&str]) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        restaurant_id: RestaurantId::new(restaurant),
        name: name.to_string(),
        description: None,
        price: None,
        menu_item_ingredients: ingredients
            .iter()
            .map(|id| IngredientLink {
                ingredient_id: (*id).to_string(),
            })
            .collect(),
        menu_item_allergies: Vec::new(),
        menu_section_id: None,
        created_at: None,
    }
}

pub fn recipe(id: &str, restaurant: &str, name: &str, ingredients: &[&str]) -> Recipe {
    Recipe {
        id: id.to_string(),
        restaurant_id: RestaurantId::new(restaurant),
        name: name.to_string(),
        description: None,
        recipe_ingredients: ingredients
            .iter()
            .map(|id| RecipeIngredient {
                ingredient_id: (*id).to_string(),
                quantity: None,
            })
            .collect(),
        recipe_equipment: Vec::new(),
        created_at: None,
    }
}

pub fn allergy(id: &str, name: &str) -> Allergy {
    Allergy {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        severity: None,
    }
}

pub fn active(restaurant: &str) -> SessionContext {
    let selected = SelectedRestaurant::new(restaurant).expect("valid restaurant id");
    SessionContext::new(Some(selected), Some(UserSession::new("chef")))
}

/// Per-restaurant records served by [`FakeSource`].
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub ingredients: Vec<Ingredient>,
    pub menu_items: Vec<MenuItem>,
    pub recipes: Vec<Recipe>,
}

/// In-memory backend. Every scoped collection is tagged with the requested
/// restaurant so tests can check a snapshot never mixes restaurants.
#[derive(Default)]
pub struct FakeSource {
    datasets: Mutex<HashMap<String, Dataset>>,
    allergies: Mutex<Vec<Allergy>>,
    batches: AtomicUsize,
    requests: Mutex<Vec<ListParams>>,
    fail: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, restaurant: &str, dataset: Dataset) {
        self.datasets
            .lock()
            .unwrap()
            .insert(restaurant.to_string(), dataset);
    }

    pub fn set_allergies(&self, allergies: Vec<Allergy>) {
        *self.allergies.lock().unwrap() = allergies;
    }

    /// Number of `menu-items` requests, i.e. batch loads started.
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ListParams> {
        self.requests.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Hold the next `menu-items` request until the returned handle is
    /// notified.
    pub fn hold_next(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    fn dataset(&self, params: &ListParams) -> Dataset {
        let key = params
            .restaurant_id
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default();
        self.datasets
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self) -> Result<(), SourceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SourceError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn scope(params: &ListParams) -> RestaurantId {
        params.restaurant_id.clone().unwrap_or_default()
    }
}

#[async_trait]
impl RestaurantDataSource for FakeSource {
    async fn list_menu_items(&self, params: &ListParams) -> Result<Vec<MenuItem>, SourceError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(params.clone());
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check()?;
        Ok(self.dataset(params).menu_items)
    }

    async fn list_ingredients(&self, params: &ListParams) -> Result<Vec<Ingredient>, SourceError> {
        self.requests.lock().unwrap().push(params.clone());
        self.check()?;
        Ok(self.dataset(params).ingredients)
    }

    async fn list_allergies(&self, params: &ListParams) -> Result<Vec<Allergy>, SourceError> {
        self.requests.lock().unwrap().push(params.clone());
        self.check()?;
        Ok(self.allergies.lock().unwrap().clone())
    }

    async fn list_recipes(&self, params: &ListParams) -> Result<Vec<Recipe>, SourceError> {
        self.requests.lock().unwrap().push(params.clone());
        self.check()?;
        Ok(self.dataset(params).recipes)
    }

    async fn list_equipment(&self, _params: &ListParams) -> Result<Vec<Equipment>, SourceError> {
        self.check()?;
        Ok(vec![Equipment {
            id: "oven".to_string(),
            name: "Oven".to_string(),
            description: None,
        }])
    }

    async fn list_menu_sections(
        &self,
        params: &ListParams,
    ) -> Result<Vec<MenuSection>, SourceError> {
        self.check()?;
        Ok(vec![MenuSection {
            id: format!("{}-mains", Self::scope(params)),
            restaurant_id: Self::scope(params),
            name: "Mains".to_string(),
            menu_id: None,
            position: 0,
        }])
    }

    async fn list_menus(&self, params: &ListParams) -> Result<Vec<Menu>, SourceError> {
        self.check()?;
        Ok(vec![Menu {
            id: format!("{}-dinner", Self::scope(params)),
            restaurant_id: Self::scope(params),
            name: "Dinner".to_string(),
            description: None,
            is_active: true,
        }])
    }
}
