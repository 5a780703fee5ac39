//! Filtered, sorted and paginated list views.
//!
//! A [`ListKind`] describes one collection: how to scope, filter and sort its
//! records. [`ListWindow`] is the per-view state (sort and display window) and
//! [`ListView`] the shape handed to table and card renderers.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use futures::future::BoxFuture;
use serde::Serialize;

use crate::application::repos::{ListParams, RestaurantDataSource, SourceError};
use crate::cache::{LOAD_ERROR_MESSAGE, RestaurantSnapshot};
use crate::domain::allergies::{AllergyIndex, AllergySet};
use crate::domain::{Allergy, RestaurantId};

pub mod kinds;
pub mod pipeline;
pub mod query;

pub use kinds::{Ingredients, MenuItems, Recipes};
pub use pipeline::Match;
pub use query::{
    FilterMode, IdFilter, IngredientQuery, IngredientSortField, MenuItemQuery, MenuItemSortField,
    RecipeQuery, RecipeSortField, SortDirection,
};

pub trait ListKind: Send + Sync + 'static {
    type Record: Clone + Serialize + Send + Sync + 'static;
    type Query: Clone + PartialEq + fmt::Debug + Send + Sync;
    type SortField: Copy + PartialEq + Default + fmt::Debug + Serialize + Send + Sync;

    /// Shown when the filters legitimately leave nothing.
    const EMPTY_MESSAGE: &'static str;

    fn records(snapshot: &RestaurantSnapshot) -> &[Self::Record];
    fn record_id(record: &Self::Record) -> &str;
    fn restaurant_id(query: &Self::Query) -> &RestaurantId;

    /// Direct plus derived allergies of one record.
    fn allergies(record: &Self::Record, index: &AllergyIndex) -> AllergySet;

    /// Scoping, search and filter rules; the sort is applied separately.
    fn matches(record: &Self::Record, query: &Self::Query, allergies: &AllergySet) -> bool;

    fn compare(
        a: &Self::Record,
        a_allergies: &AllergySet,
        b: &Self::Record,
        b_allergies: &AllergySet,
        field: Self::SortField,
    ) -> Ordering;

    /// Single-value filters the server can apply; everything else stays
    /// client-side.
    fn server_filters(query: &Self::Query) -> Vec<(&'static str, String)>;

    fn fetch<'a>(
        source: &'a dyn RestaurantDataSource,
        params: &'a ListParams,
    ) -> BoxFuture<'a, Result<Vec<Self::Record>, SourceError>>;
}

/// Sort selection and display window of one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListWindow<F> {
    page_size: usize,
    display_count: usize,
    sort_field: F,
    sort_direction: SortDirection,
}

impl<F: Copy + PartialEq + Default> ListWindow<F> {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            display_count: page_size,
            sort_field: F::default(),
            sort_direction: SortDirection::Asc,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn display_count(&self) -> usize {
        self.display_count
    }

    pub fn sort_field(&self) -> F {
        self.sort_field
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    /// Back to the first page; called whenever a filter changes.
    pub fn reset(&mut self) {
        self.display_count = self.page_size;
    }

    /// Selecting the active field flips the direction; another field starts
    /// ascending. The display window is kept.
    pub fn handle_sort(&mut self, field: F) {
        if field == self.sort_field {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Asc;
        }
    }

    pub fn set_sort(&mut self, field: F, direction: SortDirection) {
        self.sort_field = field;
        self.sort_direction = direction;
    }

    pub fn load_more(&mut self) {
        self.display_count = self.display_count.saturating_add(self.page_size);
    }

    pub fn visible(&self, total: usize) -> usize {
        self.display_count.min(total)
    }

    pub fn has_more(&self, total: usize) -> bool {
        self.display_count < total
    }
}

/// What a table or card renderer consumes, identical for every list type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView<T, F> {
    pub items: Vec<T>,
    /// Resolved allergies of every visible record, by record id.
    pub allergies_map: BTreeMap<String, Vec<Allergy>>,
    pub is_loading: bool,
    pub is_error: bool,
    pub total_count: usize,
    pub display_count: usize,
    pub sort_field: F,
    pub sort_direction: SortDirection,
    pub has_more: bool,
    /// Error or empty-state text, when there is something to say.
    pub message: Option<&'static str>,
}

impl<T, F> ListView<T, F> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Inputs of [`build_view`] besides the records themselves.
pub struct ViewInputs<'a> {
    pub allergies: &'a [Allergy],
    pub is_loading: bool,
    pub is_error: bool,
}

/// Cut the visible prefix out of `matches` and resolve its allergies.
pub fn build_view<K: ListKind>(
    records: &[K::Record],
    matches: &[Match],
    window: &ListWindow<K::SortField>,
    inputs: ViewInputs<'_>,
) -> ListView<K::Record, K::SortField> {
    let total_count = matches.len();
    let visible = &matches[..window.visible(total_count)];

    let mut items = Vec::with_capacity(visible.len());
    let mut allergies_map = BTreeMap::new();
    for matched in visible {
        let record = &records[matched.index];
        allergies_map.insert(
            K::record_id(record).to_string(),
            resolve_allergies(&matched.allergies, inputs.allergies),
        );
        items.push(record.clone());
    }

    let message = if inputs.is_error {
        Some(LOAD_ERROR_MESSAGE)
    } else if total_count == 0 && !inputs.is_loading {
        Some(K::EMPTY_MESSAGE)
    } else {
        None
    };

    ListView {
        items,
        allergies_map,
        is_loading: inputs.is_loading,
        is_error: inputs.is_error,
        total_count,
        display_count: window.display_count(),
        sort_field: window.sort_field(),
        sort_direction: window.sort_direction(),
        has_more: window.has_more(total_count),
        message,
    }
}

/// Ids missing from the allergy list keep their id as the name.
fn resolve_allergies(ids: &AllergySet, allergies: &[Allergy]) -> Vec<Allergy> {
    ids.iter()
        .map(|id| {
            allergies
                .iter()
                .find(|allergy| &allergy.id == id)
                .cloned()
                .unwrap_or_else(|| Allergy {
                    id: id.clone(),
                    name: id.clone(),
                    description: None,
                    severity: None,
                })
        })
        .collect()
}
