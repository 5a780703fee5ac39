use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use brigade::application::cached::CachedListView;
use brigade::application::error::AppError;
use brigade::application::listing::{
    IdFilter, IngredientQuery, Ingredients, ListKind, MenuItemQuery, MenuItems, RecipeQuery,
    Recipes, SortDirection,
};
use brigade::application::mutations::MutationService;
use brigade::application::query::{QueryListService, QueryListView};
use brigade::cache::{CacheConfig, LoadOutcome, RestaurantDataCache};
use brigade::config::{
    Command, CreateArgs, DeleteArgs, IngredientsArgs, MenuItemsArgs, RecipesArgs, RestaurantArg,
    SessionSettings, Settings, SnapshotArgs, UpdateArgs,
};
use brigade::domain::RestaurantId;
use brigade::domain::error::DomainError;
use brigade::domain::session::{SessionContext, UserSession};
use brigade::infra::api::ApiClient;

use crate::print::{MutationSummary, SnapshotSummary, print_json};

/// User recorded in the session when none is configured.
const DEFAULT_USER: &str = "brigade-cli";

struct Runtime {
    client: Arc<ApiClient>,
    cache_config: CacheConfig,
}

pub async fn dispatch(command: Command, settings: &Settings) -> Result<(), AppError> {
    settings.api.require_base_url()?;
    let runtime = Runtime {
        client: Arc::new(ApiClient::from_settings(&settings.api)?),
        cache_config: CacheConfig::from(&settings.cache),
    };

    match command {
        Command::Snapshot(args) => snapshot(&runtime, settings, args).await,
        Command::Ingredients(args) => ingredients(&runtime, settings, args).await,
        Command::MenuItems(args) => menu_items(&runtime, settings, args).await,
        Command::Recipes(args) => recipes(&runtime, settings, args).await,
        Command::Create(args) => create(&runtime, settings, args).await,
        Command::Update(args) => update(&runtime, settings, args).await,
        Command::Delete(args) => delete(&runtime, settings, args).await,
    }
}

/// Session context of a command together with its selected restaurant.
struct Selection {
    context: SessionContext,
    restaurant_id: RestaurantId,
}

fn select(session: &SessionSettings, restaurant: &RestaurantArg) -> Result<Selection, AppError> {
    let mut context = session.context(restaurant.restaurant.as_deref())?;
    let restaurant_id = context
        .restaurant_id()
        .cloned()
        .ok_or(DomainError::NoRestaurantSelected)?;
    if context.user.is_none() {
        context.user = Some(UserSession::new(DEFAULT_USER));
    }
    Ok(Selection {
        context,
        restaurant_id,
    })
}

/// Build a cache and load the session's restaurant into it.
async fn loaded_cache(
    runtime: &Runtime,
    context: SessionContext,
) -> Result<Arc<RestaurantDataCache>, AppError> {
    let cache = Arc::new(RestaurantDataCache::new(
        runtime.client.clone(),
        runtime.cache_config.clone(),
    ));
    match cache.sync_context(context).await {
        Some(LoadOutcome::Failed { message, .. }) => Err(AppError::Load(message)),
        _ => Ok(cache),
    }
}

fn direction(desc: bool) -> SortDirection {
    if desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    }
}

async fn snapshot(runtime: &Runtime, settings: &Settings, args: SnapshotArgs) -> Result<(), AppError> {
    let selection = select(&settings.session, &args.restaurant)?;
    let cache = loaded_cache(runtime, selection.context).await?;
    let snapshot = cache
        .snapshot()
        .ok_or_else(|| AppError::Load("no data was committed".to_string()))?;

    if args.full {
        return print_json(snapshot.as_ref());
    }
    print_json(&SnapshotSummary {
        restaurant_id: snapshot.restaurant_id.clone(),
        last_updated: snapshot.last_updated,
        counts: snapshot.counts(),
    })
}

/// Query, sort and window of one list command.
struct Listing<K: ListKind> {
    query: K::Query,
    field: K::SortField,
    direction: SortDirection,
    pages: u32,
}

impl<K: ListKind> Listing<K> {
    /// Fetch through the short-lived query cache instead of a full load.
    async fn direct(self, runtime: &Runtime) -> Result<(), AppError> {
        let service = Arc::new(QueryListService::<K>::new(
            runtime.client.clone(),
            &runtime.cache_config,
        ));
        let mut view = QueryListView::new(service, self.query);
        view.set_sort(self.field, self.direction);
        view.refresh().await;
        if let Some(message) = view.error() {
            return Err(AppError::Load(message.to_string()));
        }
        for _ in 1..self.pages {
            view.load_more();
        }
        print_json(&view.view())
    }

    async fn cached(self, runtime: &Runtime, context: SessionContext) -> Result<(), AppError> {
        let cache = loaded_cache(runtime, context).await?;
        let mut view = CachedListView::<K>::new(cache, self.query);
        view.set_sort(self.field, self.direction);
        for _ in 1..self.pages {
            view.load_more();
        }
        print_json(&view.view())
    }

    async fn run(self, runtime: &Runtime, selection: Selection, direct: bool) -> Result<(), AppError> {
        if direct {
            self.direct(runtime).await
        } else {
            self.cached(runtime, selection.context).await
        }
    }
}

async fn ingredients(
    runtime: &Runtime,
    settings: &Settings,
    args: IngredientsArgs,
) -> Result<(), AppError> {
    let selection = select(&settings.session, &args.restaurant)?;
    let listing = Listing::<Ingredients> {
        query: IngredientQuery {
            restaurant_id: selection.restaurant_id.clone(),
            search: args.view.search.clone(),
            allergies: IdFilter {
                ids: args.allergies,
                mode: args.allergy_mode.into(),
            },
            categories: IdFilter {
                ids: args.categories,
                mode: args.category_mode.into(),
            },
            has_sub_ingredients: args.has_sub_ingredients,
        },
        field: args.sort.into(),
        direction: direction(args.view.desc),
        pages: args.view.pages,
    };
    listing.run(runtime, selection, args.view.direct).await
}

async fn menu_items(
    runtime: &Runtime,
    settings: &Settings,
    args: MenuItemsArgs,
) -> Result<(), AppError> {
    let selection = select(&settings.session, &args.restaurant)?;
    let listing = Listing::<MenuItems> {
        query: MenuItemQuery {
            restaurant_id: selection.restaurant_id.clone(),
            search: args.view.search.clone(),
            allergies: IdFilter {
                ids: args.allergies,
                mode: args.allergy_mode.into(),
            },
            ingredient_ids: args.ingredients,
        },
        field: args.sort.into(),
        direction: direction(args.view.desc),
        pages: args.view.pages,
    };
    listing.run(runtime, selection, args.view.direct).await
}

/// Recipes are not part of the cached views; they always query directly.
async fn recipes(runtime: &Runtime, settings: &Settings, args: RecipesArgs) -> Result<(), AppError> {
    let selection = select(&settings.session, &args.restaurant)?;
    let listing = Listing::<Recipes> {
        query: RecipeQuery {
            restaurant_id: selection.restaurant_id,
            search: args.search,
            ingredient_ids: args.ingredients,
        },
        field: args.sort.into(),
        direction: direction(args.desc),
        pages: args.pages,
    };
    listing.direct(runtime).await
}

async fn mutation_service(
    runtime: &Runtime,
    settings: &Settings,
    restaurant: &RestaurantArg,
) -> Result<MutationService, AppError> {
    let selection = select(&settings.session, restaurant)?;
    let cache = loaded_cache(runtime, selection.context).await?;
    Ok(MutationService::new(runtime.client.clone(), cache))
}

async fn create(runtime: &Runtime, settings: &Settings, args: CreateArgs) -> Result<(), AppError> {
    let body = read_body(&args.file)?;
    let service = mutation_service(runtime, settings, &args.restaurant).await?;
    let mutation = service.create(args.resource, body).await?;
    info!(target = "brigade::cli", resource = %args.resource, "create finished");
    print_json(&MutationSummary::new(mutation.record, &mutation.resync))
}

async fn update(runtime: &Runtime, settings: &Settings, args: UpdateArgs) -> Result<(), AppError> {
    let body = read_body(&args.file)?;
    let service = mutation_service(runtime, settings, &args.restaurant).await?;
    let mutation = service.update(args.resource, &args.id, body).await?;
    print_json(&MutationSummary::new(mutation.record, &mutation.resync))
}

async fn delete(runtime: &Runtime, settings: &Settings, args: DeleteArgs) -> Result<(), AppError> {
    let service = mutation_service(runtime, settings, &args.restaurant).await?;
    let mutation = service.delete(args.resource, &args.id).await?;
    print_json(&MutationSummary::new(mutation.record, &mutation.resync))
}

/// Read a JSON body from `path`, or from stdin when `path` is `-`.
fn read_body(path: &Path) -> Result<Value, AppError> {
    let raw = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(brigade::infra::error::InfraError::from)?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(brigade::infra::error::InfraError::from)?
    };
    serde_json::from_str(&raw)
        .map_err(|err| DomainError::invalid_body(err).into())
}
