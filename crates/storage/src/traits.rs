use serde_json::Value;
use sitedeck_core::{ContentKey, ids::*, plan::Plan};

use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub document_id: DocumentId,
    pub site_id: SiteId,
    pub key: ContentKey,
    pub content: Value,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRecord {
    pub hash: ContentHash,
    pub content_type: String,
    pub size: u64,
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: UserId,
    pub site_id: SiteId,
    pub email: String,
    pub password_hash: [u8; 32],
    pub salt: [u8; 16],
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    pub site_id: SiteId,
    pub name: String,
    pub plan: Plan,
}

pub trait Storage {
    // Documents
    fn get_document(
        &self,
        site_id: SiteId,
        key: &ContentKey,
    ) -> Result<Option<DocumentRecord>, StorageError>;

    /// Create the document if absent, otherwise replace its content.
    fn upsert_document(
        &mut self,
        site_id: SiteId,
        key: &ContentKey,
        content: &Value,
        now_ms: u64,
    ) -> Result<DocumentRecord, StorageError>;

    fn delete_document(&mut self, site_id: SiteId, key: &ContentKey) -> Result<bool, StorageError>;

    fn list_documents(
        &self,
        site_id: SiteId,
        content_type: &str,
    ) -> Result<Vec<DocumentRecord>, StorageError>;

    // Blobs
    fn put_blob(
        &mut self,
        bytes: &[u8],
        content_type: &str,
        now_ms: u64,
    ) -> Result<BlobRecord, StorageError>;

    /// Blobs are addressed by content hash and content type together.
    fn get_blob(
        &self,
        hash: ContentHash,
        content_type: &str,
    ) -> Result<Option<(BlobRecord, Vec<u8>)>, StorageError>;

    fn blob_count(&self) -> Result<u64, StorageError>;

    // Sites and users
    fn insert_site(&mut self, site: &SiteRecord) -> Result<(), StorageError>;

    fn get_site(&self, site_id: SiteId) -> Result<Option<SiteRecord>, StorageError>;

    fn insert_user(&mut self, user: &UserRecord) -> Result<(), StorageError>;

    fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError>;
}

/// Remembers which site the operator last selected.
pub trait SiteSelectionStore {
    fn load_selection(&self) -> Result<Option<SiteId>, StorageError>;

    fn persist_selection(&mut self, site_id: SiteId) -> Result<(), StorageError>;
}
