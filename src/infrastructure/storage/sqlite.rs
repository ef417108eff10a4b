use crate::domain::error::WizardError;
use crate::domain::traits::BlobStore;
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use std::io::Cursor;
use std::path::Path;
use tokio_rusqlite::Connection;
use zstd::stream::{decode_all, encode_all};

const CREATE_SNAPSHOTS: &str = "CREATE TABLE IF NOT EXISTS snapshots (
    namespace TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    original_size INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)";

pub async fn init_database(db_path: &Path) -> Result<Connection, WizardError> {
    let db = Connection::open(db_path.to_path_buf()).await?;
    create_schema(&db).await?;
    Ok(db)
}

pub async fn init_memory_database() -> Result<Connection, WizardError> {
    let db = Connection::open_in_memory().await?;
    create_schema(&db).await?;
    Ok(db)
}

async fn create_schema(db: &Connection) -> Result<(), WizardError> {
    db.call(|conn| conn.execute(CREATE_SNAPSHOTS, []).map(|_| ()))
        .await?;
    Ok(())
}

/// One zstd-compressed blob per namespace.
pub struct SqliteBlobStore {
    conn: Connection,
}

impl SqliteBlobStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    async fn read(&self, namespace: &str) -> Result<Option<Vec<u8>>, WizardError> {
        let namespace = namespace.to_string();
        let compressed = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT data FROM snapshots WHERE namespace = ?",
                    params![namespace],
                    |row| row.get::<_, Vec<u8>>(0),
                )
                .optional()
            })
            .await?;

        match compressed {
            Some(data) => Ok(Some(decode_all(Cursor::new(&data))?)),
            None => Ok(None),
        }
    }

    async fn write(&self, namespace: &str, data: Vec<u8>) -> Result<(), WizardError> {
        let compressed = encode_all(Cursor::new(&data), 0)?;
        let original_len = data.len() as i64;
        let now = chrono::Utc::now().timestamp_millis();
        let namespace = namespace.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO snapshots (namespace, data, original_size, updated_at)
                     VALUES (?, ?, ?, ?)",
                    params![namespace, compressed, original_len, now],
                )
                .map(|_| ())
            })
            .await?;

        Ok(())
    }

    async fn namespaces(&self) -> Result<Vec<(String, i64)>, WizardError> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT namespace, updated_at FROM snapshots ORDER BY namespace")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<(String, i64)>, rusqlite::Error>>()?;
                Ok::<_, rusqlite::Error>(rows)
            })
            .await?;
        Ok(rows)
    }
}
