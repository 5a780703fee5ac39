//! REST client for the restaurant backend.

use async_trait::async_trait;
use brigade_api_types::ListPayload;
use metrics::counter;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::repos::{
    ListParams, RecordWriter, Resource, RestaurantDataSource, SourceError,
};
use crate::config::ApiSettings;
use crate::domain::{Allergy, Equipment, Ingredient, Menu, MenuItem, MenuSection, Recipe};

use super::error::InfraError;

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base: Url, settings: &ApiSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(InfraError::Client)?;
        Ok(Self {
            client,
            base,
            token: settings.token.clone(),
        })
    }

    pub fn from_settings(settings: &ApiSettings) -> Result<Self, InfraError> {
        let base = settings
            .base_url
            .clone()
            .ok_or(InfraError::MissingBaseUrl)?;
        Self::new(base, settings)
    }

    pub fn user_agent() -> &'static str {
        concat!("brigade/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, SourceError> {
        self.base
            .join(path)
            .map_err(|err| SourceError::InvalidRequest(format!("invalid path `{path}`: {err}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        params: &ListParams,
    ) -> Result<Vec<T>, SourceError> {
        let mut url = self.url(resource.path())?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }

        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(SourceError::transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(SourceError::transport)?;
        Ok(process_response(resource, status, &body))
    }

    async fn write(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, SourceError> {
        let url = self.url(path)?;
        let mut request = self.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(SourceError::transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(SourceError::transport)?;
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|err| SourceError::Decode(err.to_string()))
    }
}

/// Normalize a list response. Only `200 OK` with a bare array or a
/// `{ "data": [...] }` envelope yields records; every other status or shape
/// is an empty list. Elements that fail to decode are skipped one by one.
pub fn process_response<T: DeserializeOwned>(
    resource: Resource,
    status: StatusCode,
    body: &[u8],
) -> Vec<T> {
    if status != StatusCode::OK {
        counter!("brigade_response_shape_fallback_total", "resource" => resource.path())
            .increment(1);
        warn!(
            target = "brigade::api",
            %resource,
            status = status.as_u16(),
            "unexpected status for list request; using an empty list"
        );
        return Vec::new();
    }

    let payload = ListPayload::<Value>::decode(body);
    if !payload.is_recognized() {
        counter!("brigade_response_shape_fallback_total", "resource" => resource.path())
            .increment(1);
        warn!(
            target = "brigade::api",
            %resource,
            bytes = body.len(),
            "unrecognized list response shape; using an empty list"
        );
        return Vec::new();
    }

    let decoded = payload.decode_records::<T>();
    for skipped in &decoded.skipped {
        counter!("brigade_record_skipped_total", "resource" => resource.path()).increment(1);
        warn!(
            target = "brigade::api",
            %resource,
            position = skipped.position,
            id = skipped.id.as_deref().unwrap_or("<none>"),
            reason = %skipped.reason,
            "skipping malformed record"
        );
    }
    debug!(
        target = "brigade::api",
        %resource,
        count = decoded.items.len(),
        skipped = decoded.skipped.len(),
        "list fetched"
    );
    decoded.items
}

#[async_trait]
impl RestaurantDataSource for ApiClient {
    async fn list_menu_items(&self, params: &ListParams) -> Result<Vec<MenuItem>, SourceError> {
        self.list(Resource::MenuItems, params).await
    }

    async fn list_ingredients(
        &self,
        params: &ListParams,
    ) -> Result<Vec<Ingredient>, SourceError> {
        self.list(Resource::Ingredients, params).await
    }

    async fn list_allergies(&self, params: &ListParams) -> Result<Vec<Allergy>, SourceError> {
        self.list(Resource::Allergies, params).await
    }

    async fn list_recipes(&self, params: &ListParams) -> Result<Vec<Recipe>, SourceError> {
        self.list(Resource::Recipes, params).await
    }

    async fn list_equipment(&self, params: &ListParams) -> Result<Vec<Equipment>, SourceError> {
        self.list(Resource::Equipment, params).await
    }

    async fn list_menu_sections(
        &self,
        params: &ListParams,
    ) -> Result<Vec<MenuSection>, SourceError> {
        self.list(Resource::MenuSections, params).await
    }

    async fn list_menus(&self, params: &ListParams) -> Result<Vec<Menu>, SourceError> {
        self.list(Resource::Menus, params).await
    }
}

#[async_trait]
impl RecordWriter for ApiClient {
    async fn create(&self, resource: Resource, body: Value) -> Result<Value, SourceError> {
        self.write(Method::POST, resource.path(), Some(body)).await
    }

    async fn update(&self, resource: Resource, id: &str, body: Value) -> Result<Value, SourceError> {
        let path = format!("{}/{}", resource.path(), id);
        self.write(Method::PATCH, &path, Some(body)).await
    }

    async fn delete(&self, resource: Resource, id: &str) -> Result<(), SourceError> {
        let path = format!("{}/{}", resource.path(), id);
        self.write(Method::DELETE, &path, None).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_and_bare_arrays_are_unwrapped() {
        let bare: Vec<Allergy> = process_response(
            Resource::Allergies,
            StatusCode::OK,
            br#"[{"id":"gluten","name":"Gluten"}]"#,
        );
        let envelope: Vec<Allergy> = process_response(
            Resource::Allergies,
            StatusCode::OK,
            br#"{"data":[{"id":"gluten","name":"Gluten"}],"hasNextPage":false}"#,
        );
        assert_eq!(bare, envelope);
        assert_eq!(bare.len(), 1);
    }

    #[test]
    fn non_ok_status_yields_empty_list() {
        let items: Vec<Allergy> = process_response(
            Resource::Allergies,
            StatusCode::CREATED,
            br#"[{"id":"gluten","name":"Gluten"}]"#,
        );
        assert!(items.is_empty());
    }

    #[test]
    fn unknown_shape_yields_empty_list() {
        let items: Vec<Allergy> =
            process_response(Resource::Allergies, StatusCode::OK, br#"{"items":[]}"#);
        assert!(items.is_empty());

        let items: Vec<Allergy> = process_response(Resource::Allergies, StatusCode::OK, b"oops");
        assert!(items.is_empty());
    }

    #[test]
    fn null_array_field_keeps_every_record() {
        let items: Vec<Ingredient> = process_response(
            Resource::Ingredients,
            StatusCode::OK,
            br#"[{"id":"flour","restaurantId":"r1","name":"Flour","categories":null},{"id":"milk","restaurantId":"r1","name":"Milk","categories":["dairy"]}]"#,
        );
        assert_eq!(items.len(), 2);
        assert!(items[0].categories.is_empty());
        assert_eq!(items[1].categories, vec!["dairy".to_string()]);
    }

    #[test]
    fn malformed_record_does_not_empty_the_list() {
        let items: Vec<MenuItem> = process_response(
            Resource::MenuItems,
            StatusCode::OK,
            br#"{"data":[{"id":"soup","restaurantId":"r1","name":"Soup","price":"7.50"},{"id":"salad","restaurantId":"r1","name":"Salad","price":9.0}]}"#,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "salad");
    }

    #[test]
    fn endpoints_join_below_base_path() {
        let settings = ApiSettings {
            base_url: Some(Url::parse("http://localhost:9000/api/").expect("url")),
            token: None,
            timeout: std::time::Duration::from_secs(1),
        };
        let client = ApiClient::from_settings(&settings).expect("client");
        let url = client.url("menu-items/mi-1").expect("join");
        assert_eq!(url.as_str(), "http://localhost:9000/api/menu-items/mi-1");
    }
}
