use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

use crate::application::listing::{
    FilterMode, IngredientSortField, MenuItemSortField, RecipeSortField,
};
use crate::application::repos::Resource;

/// Command-line arguments for the Brigade binary.
#[derive(Debug, Parser)]
#[command(
    name = "brigade",
    version,
    about = "Restaurant data cache and list views for the Brigade backend"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "BRIGADE_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the backend base URL.
    #[arg(long = "api-base-url", value_name = "URL", global = true)]
    pub api_base_url: Option<String>,

    /// Bearer token passed through to the backend.
    #[arg(
        long = "api-token",
        env = "BRIGADE_API_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub api_token: Option<String>,

    /// Override the request timeout.
    #[arg(long = "api-timeout-seconds", value_name = "SECONDS", global = true)]
    pub api_timeout_seconds: Option<u64>,

    /// Signed-in user for the session context.
    #[arg(long = "user", value_name = "NAME", global = true)]
    pub user: Option<String>,

    /// Override the number of restaurant snapshots kept.
    #[arg(long = "restaurant-slots", value_name = "COUNT", global = true)]
    pub restaurant_slots: Option<u64>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Load every collection of a restaurant and print a summary.
    Snapshot(SnapshotArgs),
    /// List ingredients with filters, sort and pagination.
    Ingredients(IngredientsArgs),
    /// List menu items with filters, sort and pagination.
    #[command(name = "menu-items")]
    MenuItems(MenuItemsArgs),
    /// List recipes through direct queries.
    Recipes(RecipesArgs),
    /// Create a record, then resync the restaurant.
    Create(CreateArgs),
    /// Update a record, then resync the restaurant.
    Update(UpdateArgs),
    /// Delete a record, then resync the restaurant.
    Delete(DeleteArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct RestaurantArg {
    /// Restaurant to work on; defaults to `session.restaurant_id`.
    #[arg(long = "restaurant", value_name = "ID")]
    pub restaurant: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub restaurant: RestaurantArg,

    /// Print the full snapshot instead of collection counts.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub full: bool,
}

/// Sort and pagination options shared by the list commands.
#[derive(Debug, Args, Clone)]
pub struct ViewArgs {
    /// Case-insensitive text search.
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub search: String,

    /// Sort descending.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub desc: bool,

    /// Number of pages to show.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Query the backend directly instead of loading the whole restaurant.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub direct: bool,
}

#[derive(Debug, Args, Clone)]
pub struct IngredientsArgs {
    #[command(flatten)]
    pub restaurant: RestaurantArg,

    #[command(flatten)]
    pub view: ViewArgs,

    /// Allergy id to filter on; repeatable.
    #[arg(long = "allergy", value_name = "ID")]
    pub allergies: Vec<String>,

    #[arg(long = "allergy-mode", value_enum, default_value_t = FilterModeArg::Exclude)]
    pub allergy_mode: FilterModeArg,

    /// Category to filter on; repeatable.
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,

    #[arg(long = "category-mode", value_enum, default_value_t = FilterModeArg::Include)]
    pub category_mode: FilterModeArg,

    /// Keep only composite (true) or simple (false) ingredients.
    #[arg(
        long = "has-sub-ingredients",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub has_sub_ingredients: Option<bool>,

    #[arg(long, value_enum, default_value_t = IngredientSortArg::Name)]
    pub sort: IngredientSortArg,
}

#[derive(Debug, Args, Clone)]
pub struct MenuItemsArgs {
    #[command(flatten)]
    pub restaurant: RestaurantArg,

    #[command(flatten)]
    pub view: ViewArgs,

    /// Allergy id to filter on; repeatable.
    #[arg(long = "allergy", value_name = "ID")]
    pub allergies: Vec<String>,

    #[arg(long = "allergy-mode", value_enum, default_value_t = FilterModeArg::Exclude)]
    pub allergy_mode: FilterModeArg,

    /// Keep items using any of these ingredients; repeatable.
    #[arg(long = "ingredient", value_name = "ID")]
    pub ingredients: Vec<String>,

    #[arg(long, value_enum, default_value_t = MenuItemSortArg::Name)]
    pub sort: MenuItemSortArg,
}

#[derive(Debug, Args, Clone)]
pub struct RecipesArgs {
    #[command(flatten)]
    pub restaurant: RestaurantArg,

    /// Case-insensitive text search.
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub search: String,

    /// Keep recipes using any of these ingredients; repeatable.
    #[arg(long = "ingredient", value_name = "ID")]
    pub ingredients: Vec<String>,

    #[arg(long, value_enum, default_value_t = RecipeSortArg::Name)]
    pub sort: RecipeSortArg,

    /// Sort descending.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub desc: bool,

    /// Number of pages to show.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,
}

#[derive(Debug, Args, Clone)]
pub struct CreateArgs {
    #[command(flatten)]
    pub restaurant: RestaurantArg,

    /// Resource path, e.g. `ingredients` or `menu-items`.
    #[arg(value_name = "RESOURCE")]
    pub resource: Resource,

    /// JSON body; `-` reads standard input.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub restaurant: RestaurantArg,

    #[arg(value_name = "RESOURCE")]
    pub resource: Resource,

    #[arg(value_name = "ID")]
    pub id: String,

    /// JSON body; `-` reads standard input.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub restaurant: RestaurantArg,

    #[arg(value_name = "RESOURCE")]
    pub resource: Resource,

    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterModeArg {
    Include,
    Exclude,
}

impl From<FilterModeArg> for FilterMode {
    fn from(value: FilterModeArg) -> Self {
        match value {
            FilterModeArg::Include => FilterMode::Include,
            FilterModeArg::Exclude => FilterMode::Exclude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IngredientSortArg {
    Name,
    Allergies,
    Categories,
    SubIngredients,
}

impl From<IngredientSortArg> for IngredientSortField {
    fn from(value: IngredientSortArg) -> Self {
        match value {
            IngredientSortArg::Name => IngredientSortField::Name,
            IngredientSortArg::Allergies => IngredientSortField::AllergyCount,
            IngredientSortArg::Categories => IngredientSortField::CategoryCount,
            IngredientSortArg::SubIngredients => IngredientSortField::SubIngredientCount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MenuItemSortArg {
    Name,
    Price,
    Ingredients,
    Allergies,
}

impl From<MenuItemSortArg> for MenuItemSortField {
    fn from(value: MenuItemSortArg) -> Self {
        match value {
            MenuItemSortArg::Name => MenuItemSortField::Name,
            MenuItemSortArg::Price => MenuItemSortField::Price,
            MenuItemSortArg::Ingredients => MenuItemSortField::IngredientCount,
            MenuItemSortArg::Allergies => MenuItemSortField::AllergyCount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecipeSortArg {
    Name,
    Ingredients,
}

impl From<RecipeSortArg> for RecipeSortField {
    fn from(value: RecipeSortArg) -> Self {
        match value {
            RecipeSortArg::Name => RecipeSortField::Name,
            RecipeSortArg::Ingredients => RecipeSortField::IngredientCount,
        }
    }
}
