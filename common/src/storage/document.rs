use std::{fmt, sync::Arc};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{error::AppError, storage::types::SeedRecord};

/// Address of one document inside a named collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocRef {
    pub collection: String,
    pub id: String,
}

impl DocRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set { doc: DocRef, data: SeedRecord },
    Delete { doc: DocRef },
}

impl WriteOp {
    pub fn doc(&self) -> &DocRef {
        match self {
            Self::Set { doc, .. } | Self::Delete { doc } => doc,
        }
    }
}

/// Writes that a store applies all-or-nothing on `commit`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, doc: DocRef, data: SeedRecord) -> &mut Self {
        self.ops.push(WriteOp::Set { doc, data });
        self
    }

    pub fn delete(&mut self, doc: DocRef) -> &mut Self {
        self.ops.push(WriteOp::Delete { doc });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// The document database as seen by the seeder. Nothing above this trait
/// knows which database sits underneath.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document currently stored in `collection`.
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocRef>, AppError>;

    /// Applies every write in `batch` atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<(), AppError>;

    /// Replaces a single document outside of any batch.
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: SeedRecord,
    ) -> Result<(), AppError>;

    fn new_batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    fn generate_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Opens a store on demand, so a run can decide not to connect at all.
#[async_trait]
pub trait StoreProvider: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn DocumentStore>, AppError>;
}

#[async_trait]
impl StoreProvider for Arc<dyn DocumentStore> {
    async fn connect(&self) -> Result<Arc<dyn DocumentStore>, AppError> {
        Ok(Arc::clone(self))
    }
}
