//! Key-value persistence.
//!
//! Every piece of state is a JSON document under a fixed key. `KvStore` is the
//! raw seam (in-memory by default, Redis when `REDIS_URL` is set);
//! `Repository` adds typed access and serializes read-modify-write cycles.

pub mod autosave;
pub mod memory;
pub mod redis_store;
pub mod repository;

use async_trait::async_trait;

use crate::errors::AppError;

pub use autosave::Autosave;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use repository::Repository;

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: String) -> Result<(), AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// Key names, all sharing one prefix.
#[derive(Debug, Clone)]
pub struct StorageKeys {
    prefix: String,
}

impl StorageKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        StorageKeys {
            prefix: prefix.into(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}-{}", self.prefix, name)
    }

    pub fn cv(&self) -> String {
        self.key("data")
    }

    pub fn letters(&self) -> String {
        self.key("letters")
    }

    pub fn session(&self) -> String {
        self.key("auth")
    }

    pub fn users(&self) -> String {
        self.key("users")
    }

    pub fn preferences(&self) -> String {
        self.key("preferences")
    }

    /// Single slot used to hand a freshly generated letter to the preview page.
    pub fn current_letter(&self) -> String {
        self.key("current-letter-id")
    }
}
