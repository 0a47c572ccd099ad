//! Mediated object access
//!
//! [`AccessMediator`] is the only component that talks to both the catalog
//! and the object store. It decides whether an identity may touch a video
//! and, if so, hands out a capability URL for the video's storage key.

use std::sync::Arc;

use common::error::DatabaseError;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    models::video::VideoRecord,
    repositories::VideoCatalog,
    storage::{CapabilitySigner, StorageError},
};

/// Failures surfaced by the mediator. Both are retryable by the caller.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The object store could not mint a capability
    #[error("Object store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),

    /// The catalog could not create or look up a record
    #[error("Persistence error: {0}")]
    Persistence(#[from] DatabaseError),
}

pub type AccessResult<T> = Result<T, AccessError>;

/// A freshly reserved upload slot
#[derive(Debug, Clone)]
pub struct UploadCapability {
    pub record_id: Uuid,
    pub capability_url: String,
}

/// Outcome of a read request.
///
/// `Denied` covers both a missing record and a record owned by someone else.
#[derive(Debug, Clone)]
pub enum ReadCapability {
    Denied,
    Granted {
        record: VideoRecord,
        capability_url: String,
    },
}

impl ReadCapability {
    pub fn is_authorized(&self) -> bool {
        matches!(self, ReadCapability::Granted { .. })
    }
}

/// Authorizes video access and issues capability URLs
pub struct AccessMediator {
    catalog: Arc<dyn VideoCatalog>,
    signer: Arc<dyn CapabilitySigner>,
}

impl AccessMediator {
    pub fn new(catalog: Arc<dyn VideoCatalog>, signer: Arc<dyn CapabilitySigner>) -> Self {
        Self { catalog, signer }
    }

    /// Reserve a record for `identity` and sign a write URL for its key.
    ///
    /// The record is persisted before signing. If signing fails the record
    /// stays in the catalog.
    #[instrument(skip(self, title), fields(user_id = %identity))]
    pub async fn issue_upload_capability(
        &self,
        identity: Uuid,
        title: &str,
    ) -> AccessResult<UploadCapability> {
        let record = self.catalog.create(identity, title).await?;
        let capability_url = self.signer.sign_write(&record.storage_ref()).await?;

        info!(video_id = %record.id, "Issued upload capability");

        Ok(UploadCapability {
            record_id: record.id,
            capability_url,
        })
    }

    /// Sign a read URL for `record_id` if `identity` owns it
    #[instrument(skip(self), fields(user_id = %identity))]
    pub async fn issue_read_capability(
        &self,
        identity: Uuid,
        record_id: Uuid,
    ) -> AccessResult<ReadCapability> {
        let record = match self.catalog.find_by_id(record_id).await? {
            Some(record) if record.user_id == identity => record,
            _ => {
                info!(video_id = %record_id, "Read capability denied");
                return Ok(ReadCapability::Denied);
            }
        };

        let capability_url = self.signer.sign_read(&record.storage_ref()).await?;

        Ok(ReadCapability::Granted {
            record,
            capability_url,
        })
    }

    /// Every record owned by `identity`, metadata only
    pub async fn list_for_identity(&self, identity: Uuid) -> AccessResult<Vec<VideoRecord>> {
        Ok(self.catalog.find_by_owner(identity).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryVideoCatalog;
    use crate::testing::{FakeSigner, UnavailableCatalog};
    use std::collections::HashSet;

    fn mediator_with(signer: FakeSigner) -> (AccessMediator, Arc<InMemoryVideoCatalog>) {
        let catalog = Arc::new(InMemoryVideoCatalog::new());
        let mediator = AccessMediator::new(catalog.clone(), Arc::new(signer));
        (mediator, catalog)
    }

    #[tokio::test]
    async fn upload_creates_owned_record_and_signs_its_key() {
        let (mediator, catalog) = mediator_with(FakeSigner::new());
        let owner = Uuid::new_v4();

        let slot = mediator
            .issue_upload_capability(owner, "trip.mp4")
            .await
            .unwrap();

        let record = catalog.find_by_id(slot.record_id).await.unwrap().unwrap();
        assert_eq!(record.user_id, owner);
        assert_eq!(record.title, "trip.mp4");
        assert_eq!(
            slot.capability_url,
            FakeSigner::write_url(&format!("{}/{}", owner, slot.record_id))
        );
    }

    #[tokio::test]
    async fn sequential_uploads_never_collide() {
        let (mediator, catalog) = mediator_with(FakeSigner::new());
        let owner = Uuid::new_v4();

        let mut ids = HashSet::new();
        let mut urls = HashSet::new();
        for _ in 0..16 {
            let slot = mediator
                .issue_upload_capability(owner, "same title")
                .await
                .unwrap();
            ids.insert(slot.record_id);
            urls.insert(slot.capability_url);
        }

        assert_eq!(ids.len(), 16);
        assert_eq!(urls.len(), 16);

        let listed: HashSet<Uuid> = catalog
            .find_by_owner(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn concurrent_uploads_by_one_owner_are_independent() {
        let catalog = Arc::new(InMemoryVideoCatalog::new());
        let mediator = Arc::new(AccessMediator::new(
            catalog.clone(),
            Arc::new(FakeSigner::new()),
        ));
        let owner = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let mediator = mediator.clone();
                tokio::spawn(async move {
                    mediator
                        .issue_upload_capability(owner, &format!("clip-{n}.webm"))
                        .await
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            let slot = handle.await.unwrap().unwrap();
            ids.insert(slot.record_id);
        }
        assert_eq!(ids.len(), 8);

        let listed: HashSet<Uuid> = catalog
            .find_by_owner(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn owner_gets_read_capability() {
        let (mediator, _) = mediator_with(FakeSigner::new());
        let owner = Uuid::new_v4();
        let slot = mediator
            .issue_upload_capability(owner, "trip.mp4")
            .await
            .unwrap();

        match mediator
            .issue_read_capability(owner, slot.record_id)
            .await
            .unwrap()
        {
            ReadCapability::Granted {
                record,
                capability_url,
            } => {
                assert_eq!(record.id, slot.record_id);
                assert_eq!(
                    capability_url,
                    FakeSigner::read_url(&format!("{}/{}", owner, slot.record_id))
                );
            }
            ReadCapability::Denied => panic!("owner should be authorized"),
        }
    }

    #[tokio::test]
    async fn foreign_and_missing_records_are_denied_alike() {
        let signer = FakeSigner::new();
        let (mediator, _) = mediator_with(signer.clone());
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let slot = mediator
            .issue_upload_capability(owner, "private.mp4")
            .await
            .unwrap();

        let foreign = mediator
            .issue_read_capability(stranger, slot.record_id)
            .await
            .unwrap();
        let missing = mediator
            .issue_read_capability(stranger, Uuid::new_v4())
            .await
            .unwrap();

        assert!(!foreign.is_authorized());
        assert!(!missing.is_authorized());
        assert_eq!(signer.read_calls(), 0);
    }

    #[tokio::test]
    async fn signing_failure_on_upload_leaves_record_behind() {
        let (mediator, catalog) = mediator_with(FakeSigner::failing());
        let owner = Uuid::new_v4();

        let result = mediator.issue_upload_capability(owner, "orphan").await;
        assert!(matches!(result, Err(AccessError::StoreUnavailable(_))));

        let records = catalog.find_by_owner(owner).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "orphan");
    }

    #[tokio::test]
    async fn signing_failure_after_authorization_is_store_unavailable() {
        let catalog = Arc::new(InMemoryVideoCatalog::new());
        let owner = Uuid::new_v4();
        let record = catalog.create(owner, "trip.mp4").await.unwrap();
        let mediator = AccessMediator::new(catalog, Arc::new(FakeSigner::failing()));

        let result = mediator.issue_read_capability(owner, record.id).await;
        assert!(matches!(result, Err(AccessError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn catalog_failure_on_upload_skips_signing() {
        let signer = FakeSigner::new();
        let mediator =
            AccessMediator::new(Arc::new(UnavailableCatalog), Arc::new(signer.clone()));

        let result = mediator
            .issue_upload_capability(Uuid::new_v4(), "trip.mp4")
            .await;

        assert!(matches!(result, Err(AccessError::Persistence(_))));
        assert_eq!(signer.write_calls(), 0);
    }

    #[tokio::test]
    async fn catalog_failure_on_read_is_an_error_not_a_denial() {
        let signer = FakeSigner::new();
        let mediator =
            AccessMediator::new(Arc::new(UnavailableCatalog), Arc::new(signer.clone()));

        let result = mediator
            .issue_read_capability(Uuid::new_v4(), Uuid::new_v4())
            .await;

        assert!(matches!(result, Err(AccessError::Persistence(_))));
        assert_eq!(signer.read_calls(), 0);
    }

    #[tokio::test]
    async fn catalog_failure_on_listing_is_persistence_error() {
        let mediator = AccessMediator::new(
            Arc::new(UnavailableCatalog),
            Arc::new(FakeSigner::new()),
        );

        let result = mediator.list_for_identity(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AccessError::Persistence(_))));
    }

    #[tokio::test]
    async fn listing_only_returns_own_records() {
        let (mediator, _) = mediator_with(FakeSigner::new());
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        mediator.issue_upload_capability(alice, "a1").await.unwrap();
        mediator.issue_upload_capability(bob, "b1").await.unwrap();
        mediator.issue_upload_capability(alice, "a2").await.unwrap();

        let listed = mediator.list_for_identity(alice).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|record| record.user_id == alice));

        assert!(
            mediator
                .list_for_identity(Uuid::new_v4())
                .await
                .unwrap()
                .is_empty()
        );
    }
}
