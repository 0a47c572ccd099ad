//! Test doubles shared by the unit test modules

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use uuid::Uuid;

use crate::{
    models::video::VideoRecord,
    repositories::VideoCatalog,
    storage::{CapabilitySigner, StorageError, StorageResult},
};

/// Deterministic signer that never touches the network
#[derive(Clone, Default)]
pub struct FakeSigner {
    fail: bool,
    writes: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
}

impl FakeSigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signer whose every call fails as if the store were down
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn write_url(key: &str) -> String {
        format!("https://store.test/{key}?verb=PUT")
    }

    pub fn read_url(key: &str) -> String {
        format!("https://store.test/{key}?verb=GET")
    }

    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn outage(verb: &'static str, key: &str) -> StorageError {
        StorageError::Signing {
            verb,
            key: key.to_string(),
            message: "store offline".to_string(),
        }
    }
}

#[async_trait]
impl CapabilitySigner for FakeSigner {
    async fn sign_write(&self, key: &str) -> StorageResult<String> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Self::outage("PUT", key));
        }
        Ok(Self::write_url(key))
    }

    async fn sign_read(&self, key: &str) -> StorageResult<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Self::outage("GET", key));
        }
        Ok(Self::read_url(key))
    }
}

/// Catalog whose every call fails as if the database were unreachable
pub struct UnavailableCatalog;

impl UnavailableCatalog {
    fn outage() -> DatabaseError {
        DatabaseError::Configuration("database offline".to_string())
    }
}

#[async_trait]
impl VideoCatalog for UnavailableCatalog {
    async fn create(&self, _user_id: Uuid, _title: &str) -> DatabaseResult<VideoRecord> {
        Err(Self::outage())
    }

    async fn find_by_id(&self, _id: Uuid) -> DatabaseResult<Option<VideoRecord>> {
        Err(Self::outage())
    }

    async fn find_by_owner(&self, _user_id: Uuid) -> DatabaseResult<Vec<VideoRecord>> {
        Err(Self::outage())
    }
}
