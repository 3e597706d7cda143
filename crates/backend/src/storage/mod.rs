use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use relief_shared::models::{Resource, Role};
use thiserror::Error;

const RESOURCES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("resources");
const ROLES_TABLE: TableDefinition<&str, &str> = TableDefinition::new("user_roles");

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open database: {0}")]
    Open(#[from] redb::DatabaseError),

    #[error(transparent)]
    Transaction(#[from] redb::TransactionError),

    #[error(transparent)]
    Table(#[from] redb::TableError),

    #[error(transparent)]
    Storage(#[from] redb::StorageError),

    #[error(transparent)]
    Commit(#[from] redb::CommitError),

    #[error("failed to encode resource: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result of a full scan: decodable rows plus how many were skipped.
#[derive(Debug, Default)]
pub struct Listing {
    /// Newest first by `created_at`.
    pub resources: Vec<Resource>,
    pub quarantined: usize,
}

pub struct Storage {
    db: Database,
    path: PathBuf,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Arc<Self>, StorageError> {
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(RESOURCES_TABLE)?;
            write_txn.open_table(ROLES_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Arc::new(Storage {
            db,
            path: path.to_path_buf(),
        }))
    }

    pub fn put_resource(&self, resource: &Resource) -> Result<(), StorageError> {
        let json = serde_json::to_vec(resource)?;
        self.put_raw(&resource.id, &json)
    }

    fn put_raw(&self, id: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RESOURCES_TABLE)?;
            table.insert(id, bytes)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// A stored resource, or `None` when absent or undecodable.
    pub fn get_resource(&self, id: &str) -> Result<Option<Resource>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESOURCES_TABLE)?;

        let Some(value) = table.get(id)? else {
            return Ok(None);
        };
        match serde_json::from_slice(value.value()) {
            Ok(resource) => Ok(Some(resource)),
            Err(e) => {
                tracing::warn!(%id, error = %e, "Quarantined undecodable resource");
                Ok(None)
            }
        }
    }

    /// Every decodable resource, newest first. Rows that fail to decode are
    /// logged and counted, never returned.
    pub fn list_resources(&self) -> Result<Listing, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESOURCES_TABLE)?;

        let mut listing = Listing::default();
        for entry in table.iter()? {
            let (key, value) = entry?;
            match serde_json::from_slice::<Resource>(value.value()) {
                Ok(resource) => listing.resources.push(resource),
                Err(e) => {
                    tracing::warn!(id = key.value(), error = %e, "Quarantined undecodable resource");
                    listing.quarantined += 1;
                }
            }
        }

        listing
            .resources
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listing)
    }

    pub fn count_resources(&self) -> Result<u64, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESOURCES_TABLE)?;
        Ok(table.len()?)
    }

    pub fn delete_resource(&self, id: &str) -> Result<bool, StorageError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(RESOURCES_TABLE)?;
            let result = table.remove(id)?;
            result.is_some()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Stored role of `user_id`. Unknown users and unreadable values are public.
    pub fn role_of(&self, user_id: &str) -> Result<Role, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ROLES_TABLE)?;

        let Some(value) = table.get(user_id)? else {
            return Ok(Role::Public);
        };
        Ok(value.value().parse::<Role>().unwrap_or_else(|e| {
            tracing::warn!(%user_id, error = %e, "Unreadable stored role, treating as public");
            Role::Public
        }))
    }

    pub fn set_role(&self, user_id: &str, role: Role) -> Result<(), StorageError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ROLES_TABLE)?;
            table.insert(user_id, role.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn db_size_bytes(&self) -> Result<u64, StorageError> {
        Ok(std::fs::metadata(&self.path)?.len())
    }
}
