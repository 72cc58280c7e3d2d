//! Client-side editing sessions over one document.
//!
//! Editors keep local state, send the whole edited value on save and adopt
//! the server's merged result only once the save is confirmed. A failed save
//! leaves local state as it was and posts an error notice.

use std::collections::BTreeSet;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::warn;

use sitedeck_core::{
    ContentKey, DocPath, ListManager, SiteContext,
    merge::set_at_path,
    notice::{NoticeBoard, NoticeKind},
};
use sitedeck_storage::DocumentRecord;

use crate::request::{SaveRequest, Upload};
use crate::{Engine, EngineError};

const SAVED: &str = "Changes saved.";
const DELETED: &str = "Content deleted.";

/// Edits the list stored under `list_field` of one document.
pub struct ListEditor {
    key: ContentKey,
    list_field: String,
    manager: ListManager,
    notices: NoticeBoard,
}

impl ListEditor {
    pub fn new(
        key: ContentKey,
        list_field: &str,
        manager: ListManager,
        notice_duration: Duration,
    ) -> Self {
        Self {
            key,
            list_field: list_field.to_string(),
            manager,
            notices: NoticeBoard::new(notice_duration),
        }
    }

    /// Editor whose capacity follows the site's plan.
    pub fn for_site(
        key: ContentKey,
        list_field: &str,
        site: &SiteContext,
        validation_fields: Vec<String>,
        notice_duration: Duration,
    ) -> Self {
        let manager = ListManager::new(site.item_limit(), validation_fields);
        Self::new(key, list_field, manager, notice_duration)
    }

    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    pub fn manager(&self) -> &ListManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ListManager {
        &mut self.manager
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    /// Upload targeting `field` of the item currently at `index`.
    pub fn upload_for_item(
        &self,
        index: usize,
        field: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Upload, EngineError> {
        let len = self.manager.len();
        if index >= len {
            return Err(sitedeck_core::CoreError::IndexOutOfRange { index, len }.into());
        }
        Upload::new(&format!("{}.{index}.{field}", self.list_field), content_type, bytes)
    }

    pub fn load(&mut self, engine: &Engine) -> Result<(), EngineError> {
        match engine.load(&self.key)? {
            Some(record) => self.adopt(&record)?,
            None => self.manager.reset_items(),
        }
        Ok(())
    }

    pub fn save(
        &mut self,
        engine: &mut Engine,
        token: &str,
        uploads: Vec<Upload>,
    ) -> Result<DocumentRecord, EngineError> {
        let mut patch = Map::new();
        patch.insert(self.list_field.clone(), self.manager.to_value()?);
        let mut request = SaveRequest::new(self.key.clone()).with_patch(Value::Object(patch));
        request.uploads = uploads;

        match engine.save(token, request) {
            Ok(record) => {
                self.adopt(&record)?;
                self.notices.post(NoticeKind::Success, SAVED);
                Ok(record)
            }
            Err(e) => {
                self.notices.post(NoticeKind::Error, e.to_string());
                Err(e)
            }
        }
    }

    /// Delete the document and start over from a single draft.
    pub fn delete(&mut self, engine: &mut Engine, token: &str) -> Result<bool, EngineError> {
        match engine.delete(token, &self.key) {
            Ok(removed) => {
                self.manager.reset_items();
                self.notices.post(NoticeKind::Success, DELETED);
                Ok(removed)
            }
            Err(e) => {
                self.notices.post(NoticeKind::Error, e.to_string());
                Err(e)
            }
        }
    }

    fn adopt(&mut self, record: &DocumentRecord) -> Result<(), EngineError> {
        let stored = record.content.get(&self.list_field).unwrap_or(&Value::Null);
        let dropped = self.manager.replace_from_value(stored)?;
        if dropped > 0 {
            warn!(key = %self.key, dropped, "stored list exceeds plan limit");
        }
        Ok(())
    }
}

/// Edits arbitrary fields of one document.
pub struct FormEditor {
    key: ContentKey,
    draft: Value,
    dirty: BTreeSet<String>,
    notices: NoticeBoard,
}

impl FormEditor {
    pub fn new(key: ContentKey, notice_duration: Duration) -> Self {
        Self {
            key,
            draft: Value::Object(Map::new()),
            dirty: BTreeSet::new(),
            notices: NoticeBoard::new(notice_duration),
        }
    }

    pub fn draft(&self) -> &Value {
        &self.draft
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn load(&mut self, engine: &Engine) -> Result<(), EngineError> {
        self.draft = match engine.load(&self.key)? {
            Some(record) if record.content.is_object() => record.content,
            _ => Value::Object(Map::new()),
        };
        self.dirty.clear();
        Ok(())
    }

    pub fn set(&mut self, path: &str, value: Value) -> Result<(), EngineError> {
        let path = DocPath::parse(path)?;
        set_at_path(&mut self.draft, &path, value)?;
        if let Some(top) = path.segments().first() {
            self.dirty.insert(top.as_key());
        }
        Ok(())
    }

    /// Send every touched top-level field.
    pub fn save(
        &mut self,
        engine: &mut Engine,
        token: &str,
        uploads: Vec<Upload>,
    ) -> Result<DocumentRecord, EngineError> {
        let patch: Map<String, Value> = self
            .dirty
            .iter()
            .filter_map(|key| self.draft.get(key).map(|v| (key.clone(), v.clone())))
            .collect();
        let mut request = SaveRequest::new(self.key.clone()).with_patch(Value::Object(patch));
        request.uploads = uploads;

        match engine.save(token, request) {
            Ok(record) => {
                self.draft = record.content.clone();
                self.dirty.clear();
                self.notices.post(NoticeKind::Success, SAVED);
                Ok(record)
            }
            Err(e) => {
                self.notices.post(NoticeKind::Error, e.to_string());
                Err(e)
            }
        }
    }
}
