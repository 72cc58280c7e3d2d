pub mod auth;
pub mod config;
pub mod dashboard;
pub mod editor;
pub mod error;
pub mod request;
pub mod site;
pub mod telemetry;
pub mod transcode;

pub use auth::AuthService;
pub use config::EngineConfig;
pub use dashboard::{AnalyticsSource, Dashboard, DashboardSummary};
pub use editor::{FormEditor, ListEditor};
pub use error::{EngineError, ErrorKind};
pub use request::{Part, SaveRequest, Upload};
pub use transcode::{PassthroughTranscoder, Transcoded, Transcoder};

use serde_json::Value;
use tracing::{debug, info, warn};

use sitedeck_core::{
    ContentKey, DocPath, SiteContext, clock, deep_merge,
    ids::{ContentHash, UserId},
    resolve_uploads,
    token::{Claims, TokenSigner},
};
use sitedeck_storage::{BlobRecord, DocumentRecord, SqliteStorage, Storage};

pub struct Engine {
    config: EngineConfig,
    site: SiteContext,
    storage: SqliteStorage,
    auth: AuthService,
    transcoder: Box<dyn Transcoder>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        storage: SqliteStorage,
        site: SiteContext,
        signer: TokenSigner,
    ) -> Self {
        let auth = AuthService::new(signer, config.token_ttl_ms());
        Self {
            config,
            site,
            storage,
            auth,
            transcoder: Box::new(PassthroughTranscoder),
        }
    }

    /// Set up logging and storage from `config`, then bind to the previously
    /// selected site.
    pub fn open(config: EngineConfig) -> Result<Self, EngineError> {
        if !config.init_tracing() {
            debug!("tracing subscriber already installed");
        }
        let storage = config.open_storage()?;
        let site = site::current_site(&storage)?
            .ok_or_else(|| EngineError::NotFound("no site selected".into()))?;
        let signer = config.token_signer()?;
        Ok(Self::new(config, storage, site, signer))
    }

    pub fn with_transcoder(mut self, transcoder: Box<dyn Transcoder>) -> Self {
        self.transcoder = transcoder;
        self
    }

    pub fn site(&self) -> SiteContext {
        self.site
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut SqliteStorage {
        &mut self.storage
    }

    /// Execute a batch SQL statement on the underlying connection, mapping errors.
    fn exec_batch(&self, sql: &str) -> Result<(), EngineError> {
        self.storage
            .conn()
            .execute_batch(sql)
            .map_err(|e| EngineError::Storage(sitedeck_storage::StorageError::Sqlite(e)))
    }

    // ========================================================================
    // Auth
    // ========================================================================

    pub fn register_user(&mut self, email: &str, password: &str) -> Result<UserId, EngineError> {
        let site_id = self.site.site_id;
        self.auth.register(&mut self.storage, site_id, email, password)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<String, EngineError> {
        self.auth.login(&self.storage, email, password)
    }

    /// Verify `token` and check it belongs to this engine's site.
    pub fn authorize(&self, token: &str) -> Result<Claims, EngineError> {
        let claims = self.auth.authorize(token)?;
        if claims.site_id != self.site.site_id {
            warn!(user_id = %claims.user_id, "token presented for another site");
            return Err(EngineError::Unauthorized("token is for a different site".into()));
        }
        Ok(claims)
    }

    // ========================================================================
    // Documents
    // ========================================================================

    pub fn load(&self, key: &ContentKey) -> Result<Option<DocumentRecord>, EngineError> {
        Ok(self.storage.get_document(self.site.site_id, key)?)
    }

    pub fn list_documents(&self, content_type: &str) -> Result<Vec<DocumentRecord>, EngineError> {
        Ok(self.storage.list_documents(self.site.site_id, content_type)?)
    }

    /// Merge the request's patch into the stored document, store its uploads
    /// and write their URLs into the result. Nothing is kept if any step fails.
    pub fn save(&mut self, token: &str, request: SaveRequest) -> Result<DocumentRecord, EngineError> {
        let claims = self.authorize(token)?;
        for upload in &request.uploads {
            if upload.bytes.len() as u64 > self.config.max_upload_bytes {
                return Err(EngineError::Capacity(format!(
                    "upload for {} is {} bytes (max {})",
                    upload.path,
                    upload.bytes.len(),
                    self.config.max_upload_bytes
                )));
            }
        }
        let now = clock::now_ms()?;

        // Wrap save in transaction for atomicity
        self.exec_batch("BEGIN IMMEDIATE")?;

        let result = (|| -> Result<DocumentRecord, EngineError> {
            let mut placements: Vec<(DocPath, String)> = Vec::with_capacity(request.uploads.len());
            for upload in &request.uploads {
                let blob = self.store_upload(upload, now)?;
                placements.push((upload.path.clone(), self.blob_url(&blob)));
            }

            let base = self
                .storage
                .get_document(self.site.site_id, &request.key)?
                .map(|record| record.content)
                .unwrap_or(Value::Null);
            let merged = deep_merge(&base, request.patch.as_ref());
            let resolved = resolve_uploads(merged, &placements)?;
            Ok(self
                .storage
                .upsert_document(self.site.site_id, &request.key, &resolved, now)?)
        })();

        match self.finish(result) {
            Ok(record) => {
                info!(
                    key = %request.key,
                    user_id = %claims.user_id,
                    uploads = request.uploads.len(),
                    "saved document"
                );
                Ok(record)
            }
            Err(e) => {
                warn!(key = %request.key, error = %e, "save aborted");
                Err(e)
            }
        }
    }

    /// Commit if `result` is Ok. Rolls back on an error or a failed commit so
    /// the connection never stays inside a transaction.
    fn finish<T>(&self, result: Result<T, EngineError>) -> Result<T, EngineError> {
        let outcome = result.and_then(|value| self.exec_batch("COMMIT").map(|()| value));
        if outcome.is_err() && !self.storage.conn().is_autocommit() {
            let _ = self.exec_batch("ROLLBACK");
        }
        outcome
    }

    fn store_upload(&mut self, upload: &Upload, now: u64) -> Result<BlobRecord, EngineError> {
        let transcoded = self
            .transcoder
            .transcode(&upload.bytes, &upload.content_type)?;
        debug!(
            path = %upload.path,
            from = %upload.content_type,
            to = %transcoded.content_type,
            "storing upload"
        );
        Ok(self
            .storage
            .put_blob(&transcoded.bytes, &transcoded.content_type, now)?)
    }

    /// Delete a document. Returns false if there was nothing to delete.
    pub fn delete(&mut self, token: &str, key: &ContentKey) -> Result<bool, EngineError> {
        let claims = self.authorize(token)?;
        let removed = self.storage.delete_document(self.site.site_id, key)?;
        info!(key = %key, user_id = %claims.user_id, removed, "deleted document");
        Ok(removed)
    }

    // ========================================================================
    // Blobs
    // ========================================================================

    pub fn blob_url(&self, blob: &BlobRecord) -> String {
        format!(
            "{}/blobs/{}.{}",
            self.config.public_base_url.trim_end_matches('/'),
            blob.hash,
            transcode::extension_for(&blob.content_type)
        )
    }

    pub fn get_blob(
        &self,
        hash: ContentHash,
        content_type: &str,
    ) -> Result<Option<(BlobRecord, Vec<u8>)>, EngineError> {
        Ok(self.storage.get_blob(hash, content_type)?)
    }
}
