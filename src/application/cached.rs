//! List views derived from the restaurant data cache.

use std::sync::Arc;

use tracing::debug;

use crate::application::listing::{
    self, Ingredients, ListKind, ListView, ListWindow, Match, MenuItems, SortDirection, ViewInputs,
    pipeline,
};
use crate::cache::{LoadOutcome, RestaurantDataCache, RestaurantSnapshot};
use crate::domain::allergies::AllergyIndex;
use crate::domain::session::SessionContext;

pub type CachedIngredientsView = CachedListView<Ingredients>;
pub type CachedMenuItemsView = CachedListView<MenuItems>;

struct Memo<K: ListKind> {
    snapshot: Arc<RestaurantSnapshot>,
    query: K::Query,
    sort: (K::SortField, SortDirection),
    matches: Arc<Vec<Match>>,
}

/// Filtered, sorted and paginated view over one collection of the cache.
///
/// The pipeline reruns only when the committed snapshot, the query or the
/// sort changed since the previous [`view`](Self::view).
pub struct CachedListView<K: ListKind> {
    cache: Arc<RestaurantDataCache>,
    query: K::Query,
    window: ListWindow<K::SortField>,
    memo: Option<Memo<K>>,
}

impl<K: ListKind> CachedListView<K> {
    pub fn new(cache: Arc<RestaurantDataCache>, query: K::Query) -> Self {
        let window = ListWindow::new(cache.config().page_size);
        Self {
            cache,
            query,
            window,
            memo: None,
        }
    }

    pub fn query(&self) -> &K::Query {
        &self.query
    }

    pub fn window(&self) -> &ListWindow<K::SortField> {
        &self.window
    }

    /// Replace the filters. A different query starts again from the first
    /// page.
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

    /// Ask the cache to resync the current restaurant.
    pub async fn refetch(&self) -> LoadOutcome {
        self.cache.refresh_data().await
    }

    /// Apply `context` to the cache, as a page would on mount.
    pub async fn sync(&self, context: SessionContext) -> Option<LoadOutcome> {
        self.cache.sync_context(context).await
    }

    pub fn view(&mut self) -> ListView<K::Record, K::SortField> {
        let is_loading = self.cache.is_loading();
        let is_error = self.cache.error().is_some();

        let Some(snapshot) = self.cache.snapshot() else {
            return listing::build_view::<K>(
                &[],
                &[],
                &self.window,
                ViewInputs {
                    allergies: &[],
                    is_loading,
                    is_error,
                },
            );
        };

        let matches = self.matches(&snapshot);
        listing::build_view::<K>(
            K::records(&snapshot),
            &matches,
            &self.window,
            ViewInputs {
                allergies: &snapshot.allergies,
                is_loading,
                is_error,
            },
        )
    }

    fn matches(&mut self, snapshot: &Arc<RestaurantSnapshot>) -> Arc<Vec<Match>> {
        let sort = (self.window.sort_field(), self.window.sort_direction());
        if let Some(memo) = &self.memo {
            if Arc::ptr_eq(&memo.snapshot, snapshot) && memo.query == self.query && memo.sort == sort
            {
                return memo.matches.clone();
            }
        }

        let index = AllergyIndex::build(&snapshot.ingredients);
        let matches = Arc::new(pipeline::run::<K>(
            K::records(snapshot),
            &self.query,
            &index,
            sort.0,
            sort.1,
        ));
        debug!(
            target = "brigade::listing",
            restaurant_id = %snapshot.restaurant_id,
            total = matches.len(),
            "recomputed cached list view"
        );
        self.memo = Some(Memo {
            snapshot: snapshot.clone(),
            query: self.query.clone(),
            sort,
            matches: matches.clone(),
        });
        matches
    }
}
