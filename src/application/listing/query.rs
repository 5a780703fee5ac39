//! Filter parameters of the list views.

use serde::Serialize;

use crate::domain::RestaurantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Keep records matching at least one listed id.
    #[default]
    Include,
    /// Keep records matching none of the listed ids.
    Exclude,
}

/// Multi-value id filter with include/exclude semantics. An empty id list
/// disables the filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdFilter {
    pub ids: Vec<String>,
    pub mode: FilterMode,
}

impl IdFilter {
    pub fn include<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            mode: FilterMode::Include,
        }
    }

    pub fn exclude<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            mode: FilterMode::Exclude,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.ids.is_empty()
    }

    pub fn matches<'a, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        if !self.is_active() {
            return true;
        }
        let hit = values.into_iter().any(|value| self.ids.contains(value));
        match self.mode {
            FilterMode::Include => hit,
            FilterMode::Exclude => !hit,
        }
    }

    /// The single id this filter can push to the server: only one id in
    /// include mode narrows the server result without changing semantics.
    pub fn single_include(&self) -> Option<&str> {
        match (self.mode, self.ids.as_slice()) {
            (FilterMode::Include, [only]) => Some(only.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngredientQuery {
    pub restaurant_id: RestaurantId,
    pub search: String,
    pub allergies: IdFilter,
    pub categories: IdFilter,
    /// `Some(true)` keeps composite ingredients, `Some(false)` keeps simple
    /// ones, `None` keeps both.
    pub has_sub_ingredients: Option<bool>,
}

impl IngredientQuery {
    pub fn for_restaurant(restaurant_id: impl Into<RestaurantId>) -> Self {
        Self {
            restaurant_id: restaurant_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MenuItemQuery {
    pub restaurant_id: RestaurantId,
    pub search: String,
    pub allergies: IdFilter,
    /// Keep items using any of these ingredients.
    pub ingredient_ids: Vec<String>,
}

impl MenuItemQuery {
    pub fn for_restaurant(restaurant_id: impl Into<RestaurantId>) -> Self {
        Self {
            restaurant_id: restaurant_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipeQuery {
    pub restaurant_id: RestaurantId,
    pub search: String,
    pub ingredient_ids: Vec<String>,
}

impl RecipeQuery {
    pub fn for_restaurant(restaurant_id: impl Into<RestaurantId>) -> Self {
        Self {
            restaurant_id: restaurant_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientSortField {
    #[default]
    Name,
    AllergyCount,
    CategoryCount,
    SubIngredientCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuItemSortField {
    #[default]
    Name,
    Price,
    IngredientCount,
    AllergyCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSortField {
    #[default]
    Name,
    IngredientCount,
}
