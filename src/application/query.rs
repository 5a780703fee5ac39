//! List views backed by direct list requests instead of the restaurant cache.
//!
//! Single-value filters travel in the query string, the rest of the pipeline
//! runs client-side over the response. Responses are kept in a [`QueryCache`]
//! per request for the configured lifetime.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::listing::{
    self, Ingredients, ListKind, ListView, ListWindow, MenuItems, Recipes, SortDirection,
    ViewInputs, pipeline,
};
use crate::application::repos::{ListParams, RestaurantDataSource, SourceError};
use crate::cache::{CacheConfig, QueryCache};
use crate::domain::allergies::AllergyIndex;
use crate::domain::{Allergy, Ingredient};

pub type IngredientsQueryService = QueryListService<Ingredients>;
pub type MenuItemsQueryService = QueryListService<MenuItems>;
pub type RecipesQueryService = QueryListService<Recipes>;

/// Everything one query view needs to run the pipeline.
pub struct QueryResult<K: ListKind> {
    pub records: Arc<Vec<K::Record>>,
    /// Restaurant ingredients, for derived allergies.
    pub ingredients: Arc<Vec<Ingredient>>,
    pub allergies: Arc<Vec<Allergy>>,
}

impl<K: ListKind> Clone for QueryResult<K> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            ingredients: self.ingredients.clone(),
            allergies: self.allergies.clone(),
        }
    }
}

pub struct QueryListService<K: ListKind> {
    source: Arc<dyn RestaurantDataSource>,
    fetch_limit: u32,
    page_size: usize,
    records: QueryCache<K::Record>,
    ingredients: QueryCache<Ingredient>,
    allergies: QueryCache<Allergy>,
}

impl<K: ListKind> QueryListService<K> {
    pub fn new(source: Arc<dyn RestaurantDataSource>, config: &CacheConfig) -> Self {
        Self {
            source,
            fetch_limit: config.fetch_limit,
            page_size: config.query_page_size,
            records: QueryCache::new(config),
            ingredients: QueryCache::new(config),
            allergies: QueryCache::new(config),
        }
    }

    /// Request parameters for `query`, server-side filters included.
    pub fn params(&self, query: &K::Query) -> ListParams {
        let mut params = ListParams::for_restaurant(K::restaurant_id(query), self.fetch_limit);
        params.filters = K::server_filters(query);
        params
    }

    /// Fetch the records, restaurant ingredients and allergies concurrently,
    /// each answered from its cache while fresh.
    pub async fn fetch(&self, query: &K::Query) -> Result<QueryResult<K>, SourceError> {
        let restaurant_id = K::restaurant_id(query);
        let record_params = self.params(query);
        let ingredient_params = ListParams::for_restaurant(restaurant_id, self.fetch_limit);
        let allergy_params = ListParams::global(self.fetch_limit);
        let source = self.source.as_ref();

        let (records, ingredients, allergies) = tokio::try_join!(
            through_cache(
                &self.records,
                &record_params,
                K::fetch(source, &record_params)
            ),
            through_cache(
                &self.ingredients,
                &ingredient_params,
                source.list_ingredients(&ingredient_params)
            ),
            through_cache(
                &self.allergies,
                &allergy_params,
                source.list_allergies(&allergy_params)
            ),
        )?;

        Ok(QueryResult {
            records,
            ingredients,
            allergies,
        })
    }

    /// Forget every cached response; the next fetch goes to the backend.
    pub fn invalidate(&self) {
        self.records.invalidate_all();
        self.ingredients.invalidate_all();
        self.allergies.invalidate_all();
    }
}

async fn through_cache<T>(
    cache: &QueryCache<T>,
    params: &ListParams,
    fetch: impl Future<Output = Result<Vec<T>, SourceError>>,
) -> Result<Arc<Vec<T>>, SourceError> {
    if let Some(items) = cache.get(params) {
        return Ok(items);
    }
    let items = fetch.await?;
    Ok(cache.put(params.clone(), items))
}

/// Query-backed counterpart of
/// [`CachedListView`](crate::application::cached::CachedListView).
///
/// Call [`refresh`](Self::refresh) after changing the query; the view keeps
/// rendering the previous response, re-filtered client-side, until then.
pub struct QueryListView<K: ListKind> {
    service: Arc<QueryListService<K>>,
    query: K::Query,
    window: ListWindow<K::SortField>,
    data: Option<QueryResult<K>>,
    error: Option<String>,
}

impl<K: ListKind> QueryListView<K> {
    pub fn new(service: Arc<QueryListService<K>>, query: K::Query) -> Self {
        let window = ListWindow::new(service.page_size);
        Self {
            service,
            query,
            window,
            data: None,
            error: None,
        }
    }

    pub fn query(&self) -> &K::Query {
        &self.query
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_query(&mut self, query: K::Query) {
        if query != self.query {
            self.query = query;
            self.window.reset();
        }
    }

    pub fn handle_sort(&mut self, field: K::SortField) {
        self.window.handle_sort(field);
    }

    pub fn set_sort(&mut self, field: K::SortField, direction: SortDirection) {
        self.window.set_sort(field, direction);
    }

    pub fn load_more(&mut self) {
        self.window.load_more();
    }

    /// Load data for the current query. A failure keeps the previous
    /// response and records the message.
    pub async fn refresh(&mut self) {
        if K::restaurant_id(&self.query).is_empty() {
            self.data = None;
            self.error = None;
            return;
        }

        match self.service.fetch(&self.query).await {
            Ok(data) => {
                debug!(
                    target = "brigade::query",
                    restaurant_id = %K::restaurant_id(&self.query),
                    fetched = data.records.len(),
                    "query list refreshed"
                );
                self.data = Some(data);
                self.error = None;
            }
            Err(err) => {
                warn!(
                    target = "brigade::query",
                    restaurant_id = %K::restaurant_id(&self.query),
                    error = %err,
                    "query list refresh failed"
                );
                self.error = Some(err.to_string());
            }
        }
    }

    /// Bypass cached responses and load again.
    pub async fn refetch(&mut self) {
        self.service.invalidate();
        self.refresh().await;
    }

    pub fn view(&self) -> ListView<K::Record, K::SortField> {
        // Nothing fetched yet for a scoped query counts as loading.
        let pending = self.data.is_none()
            && self.error.is_none()
            && !K::restaurant_id(&self.query).is_empty();
        let inputs = ViewInputs {
            allergies: &[],
            is_loading: pending,
            is_error: self.error.is_some(),
        };
        let Some(data) = &self.data else {
            return listing::build_view::<K>(&[], &[], &self.window, inputs);
        };

        let index = AllergyIndex::build(&data.ingredients);
        let matches = pipeline::run::<K>(
            &data.records,
            &self.query,
            &index,
            self.window.sort_field(),
            self.window.sort_direction(),
        );
        listing::build_view::<K>(
            &data.records,
            &matches,
            &self.window,
            ViewInputs {
                allergies: &data.allergies,
                ..inputs
            },
        )
    }
}
