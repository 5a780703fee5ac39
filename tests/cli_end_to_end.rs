#![deny(clippy::all, clippy::pedantic)]

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use std::io::Write;
use tempfile::NamedTempFile;

fn body_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    file.write_all(contents.as_bytes()).expect("write body");
    file
}

fn brigade(server: &MockServer) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("brigade"));
    cmd.env_remove("BRIGADE_CONFIG_FILE")
        .env_remove("BRIGADE_API_TOKEN")
        .env("BRIGADE__LOGGING__LEVEL", "warn")
        .arg("--api-base-url")
        .arg(server.base_url());
    cmd
}

fn mock_restaurant(server: &MockServer) {
    server.mock(|when, then| {
        when.method("GET")
            .path("/menu-items")
            .query_param("restaurantId", "r1");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"[{"id":"bread","restaurantId":"r1","name":"Bread","menuItemIngredients":[{"ingredientId":"flour"}]},{"id":"custard","restaurantId":"r1","name":"Custard","menuItemIngredients":[{"ingredientId":"milk"}]}]"#);
    });
    server.mock(|when, then| {
        when.method("GET")
            .path("/ingredients")
            .query_param("restaurantId", "r1");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"data":[{"id":"flour","restaurantId":"r1","name":"Flour","ingredientAllergies":[{"allergyId":"gluten"}]},{"id":"milk","restaurantId":"r1","name":"Milk","ingredientAllergies":[{"allergyId":"dairy"}]},{"id":"sugar","restaurantId":"r1","name":"Sugar"}]}"#);
    });
    server.mock(|when, then| {
        when.method("GET").path("/allergies");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"[{"id":"gluten","name":"Gluten"},{"id":"dairy","name":"Dairy"}]"#);
    });
    for path in ["/recipes", "/equipment", "/menu-sections", "/menus"] {
        server.mock(|when, then| {
            when.method("GET").path(path);
            then.status(200)
                .header("content-type", "application/json")
                .body("[]");
        });
    }
}

#[test]
fn snapshot_prints_collection_counts() {
    let server = MockServer::start();
    mock_restaurant(&server);

    let assert = brigade(&server)
        .arg("snapshot")
        .arg("--restaurant")
        .arg("r1")
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("\"restaurantId\": \"r1\""));
    assert!(output.contains("\"menuItems\": 2"));
    assert!(output.contains("\"ingredients\": 3"));
}

#[test]
fn ingredients_excludes_allergy() {
    let server = MockServer::start();
    mock_restaurant(&server);

    let assert = brigade(&server)
        .arg("ingredients")
        .arg("--restaurant")
        .arg("r1")
        .arg("--allergy")
        .arg("gluten")
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("\"Milk\""));
    assert!(output.contains("\"Sugar\""));
    assert!(!output.contains("\"Flour\""));
    assert!(output.contains("\"totalCount\": 2"));
}

#[test]
fn menu_items_direct_pushes_search_to_server() {
    let server = MockServer::start();
    let filtered = server.mock(|when, then| {
        when.method("GET")
            .path("/menu-items")
            .query_param("restaurantId", "r1")
            .query_param("search", "cust");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"[{"id":"custard","restaurantId":"r1","name":"Custard"}]"#);
    });

    brigade(&server)
        .arg("menu-items")
        .arg("--restaurant")
        .arg("r1")
        .arg("--search")
        .arg("cust")
        .arg("--direct")
        .assert()
        .success()
        .stdout(contains("\"Custard\""));
    filtered.assert();
}

#[test]
fn create_resyncs_the_cache() {
    let server = MockServer::start();
    mock_restaurant(&server);
    let created = server.mock(|when, then| {
        when.method("POST")
            .path("/ingredients")
            .json_body_includes(r#"{"name":"Butter"}"#);
        then.status(201)
            .header("content-type", "application/json")
            .body(r#"{"id":"butter","restaurantId":"r1","name":"Butter"}"#);
    });

    let body = body_file(r#"{"name":"Butter","restaurantId":"r1"}"#);
    brigade(&server)
        .arg("create")
        .arg("--restaurant")
        .arg("r1")
        .arg("ingredients")
        .arg("--file")
        .arg(body.path())
        .assert()
        .success()
        .stdout(contains("\"resync\": \"committed\""));
    created.assert();
}

#[test]
fn missing_restaurant_is_a_usage_error() {
    let server = MockServer::start();

    brigade(&server)
        .env_remove("BRIGADE__SESSION__RESTAURANT_ID")
        .arg("ingredients")
        .assert()
        .code(64)
        .stderr(contains("no restaurant selected"));
}

#[test]
fn missing_base_url_fails_fast() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("brigade"));
    cmd.arg("snapshot")
        .arg("--restaurant")
        .arg("r1")
        .env_remove("BRIGADE__API__BASE_URL")
        .env_remove("BRIGADE_CONFIG_FILE")
        .assert()
        .code(78)
        .stderr(contains("api.base_url"));
}
