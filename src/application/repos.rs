//! Traits describing the backend adapters the cache and list views read from
//! and the mutation service writes through.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::{
    Allergy, Equipment, Ingredient, Menu, MenuItem, MenuSection, Recipe, RestaurantId,
};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl SourceError {
    pub fn transport(err: impl fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Query string parameters of a list request.
///
/// `filters` carries the single-value filters a list view pushes to the
/// server; multi-value filters stay client-side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListParams {
    pub restaurant_id: Option<RestaurantId>,
    pub page: u32,
    pub limit: u32,
    pub filters: Vec<(&'static str, String)>,
}

impl ListParams {
    pub fn for_restaurant(restaurant_id: &RestaurantId, limit: u32) -> Self {
        Self {
            restaurant_id: Some(restaurant_id.clone()),
            page: 1,
            limit,
            filters: Vec::new(),
        }
    }

    /// Parameters for the global collections (allergies, equipment).
    pub fn global(limit: u32) -> Self {
        Self {
            restaurant_id: None,
            page: 1,
            limit,
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.filters.push((key, value.into()));
        self
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 3);
        if let Some(restaurant_id) = &self.restaurant_id {
            pairs.push(("restaurantId", restaurant_id.to_string()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        pairs.extend(self.filters.iter().cloned());
        pairs
    }
}

/// Read seam: one list operation per collection.
///
/// Implementations normalize response shapes themselves: a non-OK status or
/// an unrecognized body yields an empty list, while transport failures are
/// errors.
#[async_trait]
pub trait RestaurantDataSource: Send + Sync {
    async fn list_menu_items(&self, params: &ListParams) -> Result<Vec<MenuItem>, SourceError>;
    async fn list_ingredients(&self, params: &ListParams)
    -> Result<Vec<Ingredient>, SourceError>;
    async fn list_allergies(&self, params: &ListParams) -> Result<Vec<Allergy>, SourceError>;
    async fn list_recipes(&self, params: &ListParams) -> Result<Vec<Recipe>, SourceError>;
    async fn list_equipment(&self, params: &ListParams) -> Result<Vec<Equipment>, SourceError>;
    async fn list_menu_sections(
        &self,
        params: &ListParams,
    ) -> Result<Vec<MenuSection>, SourceError>;
    async fn list_menus(&self, params: &ListParams) -> Result<Vec<Menu>, SourceError>;
}

/// Writable backend resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    MenuItems,
    Ingredients,
    Allergies,
    Recipes,
    Equipment,
    MenuSections,
    Menus,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::MenuItems,
        Resource::Ingredients,
        Resource::Allergies,
        Resource::Recipes,
        Resource::Equipment,
        Resource::MenuSections,
        Resource::Menus,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Resource::MenuItems => "menu-items",
            Resource::Ingredients => "ingredients",
            Resource::Allergies => "allergies",
            Resource::Recipes => "recipes",
            Resource::Equipment => "equipment",
            Resource::MenuSections => "menu-sections",
            Resource::Menus => "menus",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Resource {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|resource| resource.path() == value)
            .ok_or_else(|| DomainError::UnknownResource(value.to_string()))
    }
}

/// Write seam used by CRUD flows. The cache never writes.
#[async_trait]
pub trait RecordWriter: Send + Sync {
    async fn create(
        &self,
        resource: Resource,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, SourceError>;

    async fn update(
        &self,
        resource: Resource,
        id: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, SourceError>;

    async fn delete(&self, resource: Resource, id: &str) -> Result<(), SourceError>;
}
