//! Writes through the backend, each followed by a cache resync.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::application::error::AppError;
use crate::application::repos::{RecordWriter, Resource};
use crate::cache::{LoadOutcome, RestaurantDataCache};
use crate::domain::error::DomainError;

/// Result of a write plus the resync it triggered.
#[derive(Debug)]
pub struct Mutation {
    pub record: Option<Value>,
    pub resync: LoadOutcome,
}

pub struct MutationService {
    writer: Arc<dyn RecordWriter>,
    cache: Arc<RestaurantDataCache>,
}

impl MutationService {
    pub fn new(writer: Arc<dyn RecordWriter>, cache: Arc<RestaurantDataCache>) -> Self {
        Self { writer, cache }
    }

    pub async fn create(&self, resource: Resource, body: Value) -> Result<Mutation, AppError> {
        ensure_object(&body)?;
        let record = self.writer.create(resource, body).await?;
        info!(target = "brigade::mutations", %resource, "record created");
        self.resync(Some(record)).await
    }

    pub async fn update(
        &self,
        resource: Resource,
        id: &str,
        body: Value,
    ) -> Result<Mutation, AppError> {
        ensure_id(id)?;
        ensure_object(&body)?;
        let record = self.writer.update(resource, id, body).await?;
        info!(target = "brigade::mutations", %resource, id, "record updated");
        self.resync(Some(record)).await
    }

    pub async fn delete(&self, resource: Resource, id: &str) -> Result<Mutation, AppError> {
        ensure_id(id)?;
        self.writer.delete(resource, id).await?;
        info!(target = "brigade::mutations", %resource, id, "record deleted");
        self.resync(None).await
    }

    async fn resync(&self, record: Option<Value>) -> Result<Mutation, AppError> {
        let resync = self.cache.refresh_data().await;
        Ok(Mutation { record, resync })
    }
}

fn ensure_id(id: &str) -> Result<(), DomainError> {
    if id.trim().is_empty() {
        return Err(DomainError::empty_id("record id"));
    }
    Ok(())
}

fn ensure_object(body: &Value) -> Result<(), DomainError> {
    if !body.is_object() {
        return Err(DomainError::invalid_body("expected a JSON object"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::application::repos::SourceError;
    use crate::cache::CacheConfig;
    use crate::testing::{FakeSource, active};

    use super::*;

    #[derive(Default)]
    struct RecordingWriter {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RecordWriter for RecordingWriter {
        async fn create(&self, resource: Resource, body: Value) -> Result<Value, SourceError> {
            self.calls.lock().unwrap().push(format!("create {resource}"));
            Ok(body)
        }

        async fn update(
            &self,
            resource: Resource,
            id: &str,
            body: Value,
        ) -> Result<Value, SourceError> {
            self.calls.lock().unwrap().push(format!("update {resource} {id}"));
            Ok(body)
        }

        async fn delete(&self, resource: Resource, id: &str) -> Result<(), SourceError> {
            self.calls.lock().unwrap().push(format!("delete {resource} {id}"));
            Ok(())
        }
    }

    async fn service() -> (MutationService, Arc<RecordingWriter>) {
        let cache = Arc::new(RestaurantDataCache::new(
            FakeSource::new(),
            CacheConfig::default(),
        ));
        cache.sync_context(active("r1")).await;
        let writer = Arc::new(RecordingWriter::default());
        (MutationService::new(writer.clone(), cache), writer)
    }

    #[tokio::test]
    async fn create_resyncs_the_cache() {
        let (service, writer) = service().await;
        let mutation = service
            .create(Resource::Ingredients, json!({ "name": "Flour" }))
            .await
            .expect("create");

        assert_eq!(mutation.record, Some(json!({ "name": "Flour" })));
        assert!(matches!(mutation.resync, LoadOutcome::Committed { .. }));
        assert_eq!(*writer.calls.lock().unwrap(), vec!["create ingredients"]);
    }

    #[tokio::test]
    async fn delete_returns_no_record() {
        let (service, writer) = service().await;
        let mutation = service
            .delete(Resource::Menus, "dinner")
            .await
            .expect("delete");

        assert!(mutation.record.is_none());
        assert_eq!(*writer.calls.lock().unwrap(), vec!["delete menus dinner"]);
    }

    #[tokio::test]
    async fn delete_rejects_blank_id() {
        let (service, writer) = service().await;
        let err = service
            .delete(Resource::Menus, "  ")
            .await
            .expect_err("blank id");

        assert!(matches!(err, AppError::Domain(DomainError::EmptyId { .. })));
        assert!(writer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_requires_object_body() {
        let (service, _) = service().await;
        let err = service
            .update(Resource::Recipes, "rec-1", json!([1, 2]))
            .await
            .expect_err("array body");
        assert!(matches!(err, AppError::Domain(_)));
    }
}
