//! Per-collection filter and sort rules.

use std::cmp::Ordering;

use futures::future::BoxFuture;

use crate::application::repos::{ListParams, RestaurantDataSource, SourceError};
use crate::cache::RestaurantSnapshot;
use crate::domain::allergies::{AllergyIndex, AllergySet};
use crate::domain::{Ingredient, MenuItem, Recipe, RestaurantId};

use super::ListKind;
use super::pipeline::{compare_count, compare_text, contains_text};
use super::query::{
    IngredientQuery, IngredientSortField, MenuItemQuery, MenuItemSortField, RecipeQuery,
    RecipeSortField,
};

#[derive(Debug, Clone, Copy)]
pub struct Ingredients;

#[derive(Debug, Clone, Copy)]
pub struct MenuItems;

#[derive(Debug, Clone, Copy)]
pub struct Recipes;

impl ListKind for Ingredients {
    type Record = Ingredient;
    type Query = IngredientQuery;
    type SortField = IngredientSortField;

    const EMPTY_MESSAGE: &'static str = "No ingredients";

    fn records(snapshot: &RestaurantSnapshot) -> &[Ingredient] {
        &snapshot.ingredients
    }

    fn record_id(record: &Ingredient) -> &str {
        &record.id
    }

    fn restaurant_id(query: &IngredientQuery) -> &RestaurantId {
        &query.restaurant_id
    }

    fn allergies(record: &Ingredient, index: &AllergyIndex) -> AllergySet {
        index.ingredient(&record.id)
    }

    fn matches(record: &Ingredient, query: &IngredientQuery, allergies: &AllergySet) -> bool {
        if record.restaurant_id != query.restaurant_id {
            return false;
        }
        if !contains_text(&record.name, &query.search) {
            return false;
        }
        if !query.allergies.matches(allergies) {
            return false;
        }
        if !query.categories.matches(&record.categories) {
            return false;
        }
        match query.has_sub_ingredients {
            Some(wanted) => record.sub_ingredients.is_empty() != wanted,
            None => true,
        }
    }

    fn compare(
        a: &Ingredient,
        a_allergies: &AllergySet,
        b: &Ingredient,
        b_allergies: &AllergySet,
        field: IngredientSortField,
    ) -> Ordering {
        match field {
            IngredientSortField::Name => compare_text(&a.name, &b.name),
            IngredientSortField::AllergyCount => {
                compare_count(a_allergies.len(), b_allergies.len())
            }
            IngredientSortField::CategoryCount => {
                compare_count(a.categories.len(), b.categories.len())
            }
            IngredientSortField::SubIngredientCount => {
                compare_count(a.sub_ingredients.len(), b.sub_ingredients.len())
            }
        }
    }

    fn server_filters(query: &IngredientQuery) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        let search = query.search.trim();
        if !search.is_empty() {
            filters.push(("search", search.to_string()));
        }
        if let Some(allergy) = query.allergies.single_include() {
            filters.push(("allergyId", allergy.to_string()));
        }
        if let Some(category) = query.categories.single_include() {
            filters.push(("category", category.to_string()));
        }
        if let Some(wanted) = query.has_sub_ingredients {
            filters.push(("hasSubIngredients", wanted.to_string()));
        }
        filters
    }

    fn fetch<'a>(
        source: &'a dyn RestaurantDataSource,
        params: &'a ListParams,
    ) -> BoxFuture<'a, Result<Vec<Ingredient>, SourceError>> {
        source.list_ingredients(params)
    }
}

impl ListKind for MenuItems {
    type Record = MenuItem;
    type Query = MenuItemQuery;
    type SortField = MenuItemSortField;

    const EMPTY_MESSAGE: &'static str = "No menu items";

    fn records(snapshot: &RestaurantSnapshot) -> &[MenuItem] {
        &snapshot.menu_items
    }

    fn record_id(record: &MenuItem) -> &str {
        &record.id
    }

    fn restaurant_id(query: &MenuItemQuery) -> &RestaurantId {
        &query.restaurant_id
    }

    fn allergies(record: &MenuItem, index: &AllergyIndex) -> AllergySet {
        index.menu_item(record)
    }

    fn matches(record: &MenuItem, query: &MenuItemQuery, allergies: &AllergySet) -> bool {
        if record.restaurant_id != query.restaurant_id {
            return false;
        }
        let description = record.description.as_deref().unwrap_or_default();
        if !(contains_text(&record.name, &query.search)
            || contains_text(description, &query.search))
        {
            return false;
        }
        if !query.allergies.matches(allergies) {
            return false;
        }
        query.ingredient_ids.is_empty()
            || record
                .menu_item_ingredients
                .iter()
                .any(|link| query.ingredient_ids.contains(&link.ingredient_id))
    }

    fn compare(
        a: &MenuItem,
        a_allergies: &AllergySet,
        b: &MenuItem,
        b_allergies: &AllergySet,
        field: MenuItemSortField,
    ) -> Ordering {
        match field {
            MenuItemSortField::Name => compare_text(&a.name, &b.name),
            MenuItemSortField::Price => a
                .price
                .unwrap_or_default()
                .total_cmp(&b.price.unwrap_or_default()),
            MenuItemSortField::IngredientCount => compare_count(
                a.menu_item_ingredients.len(),
                b.menu_item_ingredients.len(),
            ),
            MenuItemSortField::AllergyCount => {
                compare_count(a_allergies.len(), b_allergies.len())
            }
        }
    }

    fn server_filters(query: &MenuItemQuery) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        let search = query.search.trim();
        if !search.is_empty() {
            filters.push(("search", search.to_string()));
        }
        if let Some(allergy) = query.allergies.single_include() {
            filters.push(("allergyId", allergy.to_string()));
        }
        if let [ingredient] = query.ingredient_ids.as_slice() {
            filters.push(("ingredientId", ingredient.clone()));
        }
        filters
    }

    fn fetch<'a>(
        source: &'a dyn RestaurantDataSource,
        params: &'a ListParams,
    ) -> BoxFuture<'a, Result<Vec<MenuItem>, SourceError>> {
        source.list_menu_items(params)
    }
}

impl ListKind for Recipes {
    type Record = Recipe;
    type Query = RecipeQuery;
    type SortField = RecipeSortField;

    const EMPTY_MESSAGE: &'static str = "No recipes";

    fn records(snapshot: &RestaurantSnapshot) -> &[Recipe] {
        &snapshot.recipes
    }

    fn record_id(record: &Recipe) -> &str {
        &record.id
    }

    fn restaurant_id(query: &RecipeQuery) -> &RestaurantId {
        &query.restaurant_id
    }

    fn allergies(record: &Recipe, index: &AllergyIndex) -> AllergySet {
        index.recipe(record)
    }

    fn matches(record: &Recipe, query: &RecipeQuery, _allergies: &AllergySet) -> bool {
        if record.restaurant_id != query.restaurant_id {
            return false;
        }
        let description = record.description.as_deref().unwrap_or_default();
        if !(contains_text(&record.name, &query.search)
            || contains_text(description, &query.search))
        {
            return false;
        }
        query.ingredient_ids.is_empty()
            || record
                .recipe_ingredients
                .iter()
                .any(|link| query.ingredient_ids.contains(&link.ingredient_id))
    }

    fn compare(
        a: &Recipe,
        _a_allergies: &AllergySet,
        b: &Recipe,
        _b_allergies: &AllergySet,
        field: RecipeSortField,
    ) -> Ordering {
        match field {
            RecipeSortField::Name => compare_text(&a.name, &b.name),
            RecipeSortField::IngredientCount => {
                compare_count(a.recipe_ingredients.len(), b.recipe_ingredients.len())
            }
        }
    }

    fn server_filters(query: &RecipeQuery) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        let search = query.search.trim();
        if !search.is_empty() {
            filters.push(("search", search.to_string()));
        }
        if let [ingredient] = query.ingredient_ids.as_slice() {
            filters.push(("ingredientId", ingredient.clone()));
        }
        filters
    }

    fn fetch<'a>(
        source: &'a dyn RestaurantDataSource,
        params: &'a ListParams,
    ) -> BoxFuture<'a, Result<Vec<Recipe>, SourceError>> {
        source.list_recipes(params)
    }
}
