use serde_json::Value;
use sitedeck_core::{ContentKey, Plan};
use sitedeck_engine::{Engine, EngineConfig, EngineError, ListEditor, SaveRequest, Transcoder, Upload, site};
use sitedeck_storage::DocumentRecord;

pub const OWNER_PASSWORD: &str = "correct horse battery";

pub fn key(content_type: &str, subtype: &str) -> ContentKey {
    ContentKey::new(content_type, subtype).unwrap_or_else(|e| panic!("bad test key: {e}"))
}

/// One site with a signed-in owner.
pub struct TestSite {
    pub engine: Engine,
    pub email: String,
    pub token: String,
}

impl TestSite {
    pub fn new(plan: Plan) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_config(EngineConfig::default(), plan, "owner@example.com")
    }

    /// Create and select a new site in the storage `config` points at.
    pub fn with_config(
        config: EngineConfig,
        plan: Plan,
        email: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut storage = config.open_storage()?;
        let created = site::create_site(&mut storage, "Test Bakery", plan)?;
        let selected = site::select_site(&mut storage, created.site_id)?;
        let signer = config.token_signer()?;
        let mut engine = Engine::new(config, storage, selected, signer);
        engine.register_user(email, OWNER_PASSWORD)?;
        let token = engine.login(email, OWNER_PASSWORD)?;
        Ok(Self {
            engine,
            email: email.to_string(),
            token,
        })
    }

    pub fn with_transcoder(mut self, transcoder: Box<dyn Transcoder>) -> Self {
        self.engine = self.engine.with_transcoder(transcoder);
        self
    }

    pub fn save_json(&mut self, key: &ContentKey, patch: Value) -> Result<DocumentRecord, EngineError> {
        let request = SaveRequest::new(key.clone()).with_patch(patch);
        self.engine.save(&self.token, request)
    }

    /// Save with uploads given as `(path, content_type, bytes)`.
    pub fn save_with_uploads(
        &mut self,
        key: &ContentKey,
        patch: Option<Value>,
        uploads: Vec<(&str, &str, Vec<u8>)>,
    ) -> Result<DocumentRecord, EngineError> {
        let mut request = SaveRequest::new(key.clone());
        request.patch = patch;
        for (path, content_type, bytes) in uploads {
            request = request.with_upload(Upload::new(path, content_type, bytes)?);
        }
        self.engine.save(&self.token, request)
    }

    pub fn content(&self, key: &ContentKey) -> Result<Option<Value>, EngineError> {
        Ok(self.engine.load(key)?.map(|record| record.content))
    }

    /// List editor bound to this site's plan, requiring `title` on every item.
    pub fn list_editor(&self, key: &ContentKey, list_field: &str) -> ListEditor {
        ListEditor::for_site(
            key.clone(),
            list_field,
            &self.engine.site(),
            vec!["title".to_string()],
            self.engine.config().notice_duration(),
        )
    }
}
