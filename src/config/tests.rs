use std::io::Write;

use clap::Parser;
use serial_test::serial;
use tempfile::NamedTempFile;

use crate::application::listing::IngredientSortField;
use crate::application::repos::Resource;

use super::*;

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(args).expect("valid arguments")
}

#[test]
fn defaults_apply_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.api.base_url.is_none());
    assert_eq!(settings.api.timeout, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.cache.page_size.get(), 20);
    assert_eq!(settings.cache.query_page_size.get(), 10);
    assert_eq!(settings.cache.query_ttl, Duration::from_secs(300));
    assert_eq!(settings.cache.restaurant_slots.get(), 1);
    assert_eq!(settings.cache.fetch_limit.get(), 1000);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.api.base_url = Some("http://file.example".to_string());
    raw.logging.level = Some("info".to_string());

    let overrides = GlobalOverrides {
        api_base_url: Some("http://cli.example/api".to_string()),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(
        settings.api.base_url.map(String::from).as_deref(),
        Some("http://cli.example/api/")
    );
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_overrides(&GlobalOverrides {
        log_json: Some(true),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_sizes_are_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.page_size = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero page size");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.page_size",
            ..
        }
    ));
}

#[test]
fn non_http_base_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.api.base_url = Some("ftp://example.com".to_string());

    let err = Settings::from_raw(raw).expect_err("ftp scheme");
    assert!(matches!(err, LoadError::Invalid { key: "api.base_url", .. }));
}

#[test]
fn blank_session_values_are_ignored() {
    let mut raw = RawSettings::default();
    raw.session.restaurant_id = Some("   ".to_string());
    raw.session.user = Some("chef".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    let context = settings.session.context(None).expect("context");

    assert!(context.restaurant_id().is_none());
    assert!(context.has_user());
}

#[test]
fn command_restaurant_replaces_configured_one() {
    let session = SessionSettings {
        restaurant_id: Some(RestaurantId::new("r1")),
        restaurant_name: Some("Main".to_string()),
        user: Some("chef".to_string()),
    };

    let configured = session.context(None).expect("context");
    assert_eq!(configured.restaurant_id(), Some(&RestaurantId::new("r1")));

    let overridden = session.context(Some("r2")).expect("context");
    assert_eq!(overridden.restaurant_id(), Some(&RestaurantId::new("r2")));
    assert!(session.context(Some("")).is_err());
}

#[test]
#[serial]
fn file_then_env_then_cli() {
    let mut file = NamedTempFile::with_suffix(".toml").expect("temp file");
    writeln!(
        file,
        "[api]\nbase_url = \"http://file.example\"\ntimeout_seconds = 5\n\n[cache]\nrestaurant_slots = 3\npage_size = 15"
    )
    .expect("write config");

    // SAFETY: serialized with every other test touching the environment.
    unsafe {
        std::env::set_var("BRIGADE__CACHE__PAGE_SIZE", "25");
    }

    let path = file.path().to_string_lossy().into_owned();
    let cli = parse(&[
        "brigade",
        "--config-file",
        &path,
        "--restaurant-slots",
        "4",
        "snapshot",
    ]);
    let settings = load(&cli);

    unsafe {
        std::env::remove_var("BRIGADE__CACHE__PAGE_SIZE");
    }

    let settings = settings.expect("valid settings");
    assert_eq!(settings.api.timeout, Duration::from_secs(5));
    assert_eq!(settings.cache.page_size.get(), 25);
    assert_eq!(settings.cache.restaurant_slots.get(), 4);
}

#[test]
fn parse_ingredient_filters() {
    let cli = parse(&[
        "brigade",
        "ingredients",
        "--restaurant",
        "r1",
        "--allergy",
        "gluten",
        "--allergy",
        "dairy",
        "--category",
        "baking",
        "--has-sub-ingredients",
        "false",
        "--sort",
        "sub-ingredients",
        "--desc",
        "--pages",
        "2",
    ]);

    let Command::Ingredients(args) = cli.command else {
        panic!("expected ingredients command");
    };
    assert_eq!(args.restaurant.restaurant.as_deref(), Some("r1"));
    assert_eq!(args.allergies, vec!["gluten", "dairy"]);
    assert_eq!(args.allergy_mode, FilterModeArg::Exclude);
    assert_eq!(args.category_mode, FilterModeArg::Include);
    assert_eq!(args.has_sub_ingredients, Some(false));
    assert_eq!(
        IngredientSortField::from(args.sort),
        IngredientSortField::SubIngredientCount
    );
    assert!(args.view.desc);
    assert_eq!(args.view.pages, 2);
    assert!(!args.view.direct);
}

#[test]
fn parse_mutation_arguments() {
    let cli = parse(&["brigade", "delete", "menu-items", "mi-1"]);
    let Command::Delete(args) = cli.command else {
        panic!("expected delete command");
    };
    assert_eq!(args.resource, Resource::MenuItems);
    assert_eq!(args.id, "mi-1");

    assert!(CliArgs::try_parse_from(["brigade", "delete", "plates", "p-1"]).is_err());
}

#[test]
fn global_flags_after_subcommand() {
    let cli = parse(&["brigade", "recipes", "--log-json", "true", "--user", "chef"]);
    assert_eq!(cli.overrides.log_json, Some(true));
    assert_eq!(cli.overrides.user.as_deref(), Some("chef"));
}
