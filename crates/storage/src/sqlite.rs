use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;

use sitedeck_core::{ContentKey, ids::*, plan::Plan};

use crate::error::StorageError;
use crate::traits::{BlobRecord, DocumentRecord, SiteRecord, SiteSelectionStore, Storage, UserRecord};

const SELECTED_SITE_KEY: &str = "selected_site";

/// Convert Vec<u8> to fixed-size array with proper error handling.
fn to_array<const N: usize>(v: Vec<u8>, label: &str) -> Result<[u8; N], StorageError> {
    v.try_into()
        .map_err(|_| StorageError::Serialization(format!("invalid {label} length")))
}

fn encode_content(content: &Value) -> Result<Vec<u8>, StorageError> {
    rmp_serde::to_vec(content).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode_content(bytes: &[u8]) -> Result<Value, StorageError> {
    rmp_serde::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

type DocumentRow = (Vec<u8>, Vec<u8>, String, String, Vec<u8>, i64, i64);

fn read_document(row: DocumentRow) -> Result<DocumentRecord, StorageError> {
    let (doc_id, site_id, content_type, subtype, content, created_at, updated_at) = row;
    Ok(DocumentRecord {
        document_id: DocumentId::from_bytes(to_array::<16>(doc_id, "document_id")?),
        site_id: SiteId::from_bytes(to_array::<16>(site_id, "site_id")?),
        key: ContentKey::new(&content_type, &subtype)?,
        content: decode_content(&content)?,
        created_at_ms: created_at as u64,
        updated_at_ms: updated_at as u64,
    })
}

fn document_row(row: &rusqlite::Row) -> rusqlite::Result<DocumentRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

const DOCUMENT_COLUMNS: &str =
    "document_id, site_id, content_type, subtype, content, created_at, updated_at";

impl Storage for SqliteStorage {
    fn get_document(
        &self,
        site_id: SiteId,
        key: &ContentKey,
    ) -> Result<Option<DocumentRecord>, StorageError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE site_id = ?1 AND content_type = ?2 AND subtype = ?3"
                ),
                rusqlite::params![
                    site_id.as_bytes().as_slice(),
                    key.content_type(),
                    key.subtype(),
                ],
                document_row,
            )
            .optional()?;
        row.map(read_document).transpose()
    }

    fn upsert_document(
        &mut self,
        site_id: SiteId,
        key: &ContentKey,
        content: &Value,
        now_ms: u64,
    ) -> Result<DocumentRecord, StorageError> {
        let content_bytes = encode_content(content)?;
        self.conn.execute(
            "INSERT INTO documents (site_id, content_type, subtype, document_id, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(site_id, content_type, subtype) DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at",
            rusqlite::params![
                site_id.as_bytes().as_slice(),
                key.content_type(),
                key.subtype(),
                DocumentId::new().as_bytes().as_slice(),
                content_bytes,
                now_ms as i64,
            ],
        )?;
        self.get_document(site_id, key)?
            .ok_or_else(|| StorageError::NotFound(format!("document {key} after upsert")))
    }

    fn delete_document(&mut self, site_id: SiteId, key: &ContentKey) -> Result<bool, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM documents WHERE site_id = ?1 AND content_type = ?2 AND subtype = ?3",
            rusqlite::params![
                site_id.as_bytes().as_slice(),
                key.content_type(),
                key.subtype(),
            ],
        )?;
        Ok(removed > 0)
    }

    fn list_documents(
        &self,
        site_id: SiteId,
        content_type: &str,
    ) -> Result<Vec<DocumentRecord>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE site_id = ?1 AND content_type = ?2 ORDER BY subtype"
        ))?;
        let rows = stmt
            .query_map(
                rusqlite::params![site_id.as_bytes().as_slice(), content_type],
                document_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(read_document).collect()
    }

    fn put_blob(
        &mut self,
        bytes: &[u8],
        content_type: &str,
        now_ms: u64,
    ) -> Result<BlobRecord, StorageError> {
        let hash = ContentHash::from_bytes(*blake3::hash(bytes).as_bytes());
        // Identical bytes of the same type share one row.
        self.conn.execute(
            "INSERT OR IGNORE INTO blobs (hash, content_type, size, data, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                hash.as_bytes().as_slice(),
                content_type,
                bytes.len() as i64,
                bytes,
                now_ms as i64,
            ],
        )?;
        self.get_blob(hash, content_type)?
            .map(|(record, _)| record)
            .ok_or_else(|| StorageError::NotFound(format!("blob {hash} after insert")))
    }

    fn get_blob(
        &self,
        hash: ContentHash,
        content_type: &str,
    ) -> Result<Option<(BlobRecord, Vec<u8>)>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT size, data, created_at FROM blobs WHERE hash = ?1 AND content_type = ?2",
                rusqlite::params![hash.as_bytes().as_slice(), content_type],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;
        Ok(row.map(|(size, data, created_at)| {
            (
                BlobRecord {
                    hash,
                    content_type: content_type.to_string(),
                    size: size as u64,
                    created_at_ms: created_at as u64,
                },
                data,
            )
        }))
    }

    fn blob_count(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM blobs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn insert_site(&mut self, site: &SiteRecord) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO sites (site_id, name, plan) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                site.site_id.as_bytes().as_slice(),
                site.name,
                site.plan.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_site(&self, site_id: SiteId) -> Result<Option<SiteRecord>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT name, plan FROM sites WHERE site_id = ?1",
                rusqlite::params![site_id.as_bytes().as_slice()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(name, plan)| -> Result<SiteRecord, StorageError> {
            Ok(SiteRecord {
                site_id,
                name,
                plan: Plan::parse(&plan)?,
            })
        })
        .transpose()
    }

    fn insert_user(&mut self, user: &UserRecord) -> Result<(), StorageError> {
        let result = self.conn.execute(
            "INSERT INTO users (user_id, site_id, email, password_hash, salt, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                user.user_id.as_bytes().as_slice(),
                user.site_id.as_bytes().as_slice(),
                user.email,
                user.password_hash.as_slice(),
                user.salt.as_slice(),
                user.created_at_ms as i64,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(StorageError::ConstraintViolation(
                format!("user {} could not be inserted: {e}", user.email),
            )),
            Err(e) => Err(StorageError::Sqlite(e)),
        }
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, site_id, email, password_hash, salt, created_at FROM users WHERE email = ?1",
                rusqlite::params![email],
                |row| {
                    Ok((
                        row.get::<_, Vec<u8>>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(user_id, site_id, email, hash, salt, created_at)| -> Result<UserRecord, StorageError> {
            Ok(UserRecord {
                user_id: UserId::from_bytes(to_array::<16>(user_id, "user_id")?),
                site_id: SiteId::from_bytes(to_array::<16>(site_id, "site_id")?),
                email,
                password_hash: to_array::<32>(hash, "password_hash")?,
                salt: to_array::<16>(salt, "salt")?,
                created_at_ms: created_at as u64,
            })
        })
        .transpose()
    }
}

impl SiteSelectionStore for SqliteStorage {
    fn load_selection(&self) -> Result<Option<SiteId>, StorageError> {
        let value: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                rusqlite::params![SELECTED_SITE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|bytes| to_array::<16>(bytes, "selected site").map(SiteId::from_bytes))
            .transpose()
    }

    fn persist_selection(&mut self, site_id: SiteId) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![SELECTED_SITE_KEY, site_id.as_bytes().as_slice()],
        )?;
        Ok(())
    }
}
