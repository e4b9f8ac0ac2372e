use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use surrealdb::{
    engine::any::{connect, Any},
    opt::auth::Root,
    Error, Surreal,
};
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    storage::{
        document::{DocRef, DocumentStore, StoreProvider, WriteBatch, WriteOp},
        types::{SeedRecord, ID_FIELD},
    },
    utils::config::Connection,
};

const LIST_DOCUMENTS: &str =
    "SELECT VALUE type::string(record::id(id)) FROM type::table($collection);";

#[derive(Clone)]
pub struct SurrealDbClient {
    pub client: Surreal<Any>,
}

impl SurrealDbClient {
    /// # Initialize a new database client
    ///
    /// `mem://` addresses skip authentication, everything else signs in as root.
    pub async fn new(
        address: &str,
        username: &str,
        password: &str,
        namespace: &str,
        database: &str,
    ) -> Result<Self, Error> {
        let db = connect(address).await?;

        if !address.starts_with("mem://") {
            db.signin(Root { username, password }).await?;
        }

        db.use_ns(namespace).use_db(database).await?;

        Ok(SurrealDbClient { client: db })
    }

    /// Reads one document, without its record id, into `T`.
    pub async fn fetch_document<T>(&self, collection: &str, id: &str) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
    {
        self.client
            .query("SELECT * OMIT id FROM type::thing($collection, $id);")
            .bind(("collection", collection.to_string()))
            .bind(("id", id.to_string()))
            .await?
            .take(0)
    }

    pub async fn count_documents(&self, collection: &str) -> Result<usize, AppError> {
        Ok(self.list_documents(collection).await?.len())
    }
}

/// The record id already addresses the document; it is not stored twice.
fn into_content(mut data: SeedRecord) -> SeedRecord {
    data.remove(ID_FIELD);
    data
}

#[async_trait]
impl DocumentStore for SurrealDbClient {
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocRef>, AppError> {
        let ids: Vec<String> = self
            .client
            .query(LIST_DOCUMENTS)
            .bind(("collection", collection.to_string()))
            .await?
            .take(0)?;

        Ok(ids
            .into_iter()
            .map(|id| DocRef::new(collection, id))
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), AppError> {
        if batch.is_empty() {
            return Ok(());
        }

        let op_count = batch.len();
        let mut query = self.client.query("BEGIN TRANSACTION;");
        for (index, op) in batch.into_ops().into_iter().enumerate() {
            let collection = format!("c{index}");
            let id = format!("i{index}");
            match op {
                WriteOp::Set { doc, data } => {
                    let content = format!("d{index}");
                    query = query
                        .query(format!(
                            "UPSERT type::thing(${collection}, ${id}) CONTENT ${content};"
                        ))
                        .bind((collection, doc.collection))
                        .bind((id, doc.id))
                        .bind((content, into_content(data)));
                }
                WriteOp::Delete { doc } => {
                    query = query
                        .query(format!("DELETE type::thing(${collection}, ${id});"))
                        .bind((collection, doc.collection))
                        .bind((id, doc.id));
                }
            }
        }

        let response = query
            .query("COMMIT TRANSACTION;")
            .await
            .map_err(|err| AppError::BatchCommit(err.to_string()))?;
        if let Err(err) = response.check() {
            return Err(AppError::BatchCommit(format!(
                "transaction of {op_count} writes rolled back: {err}"
            )));
        }

        debug!(op_count, "committed write batch");
        Ok(())
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: SeedRecord,
    ) -> Result<(), AppError> {
        self.client
            .query("UPSERT type::thing($collection, $id) CONTENT $data;")
            .bind(("collection", collection.to_string()))
            .bind(("id", id.to_string()))
            .bind(("data", into_content(data)))
            .await?
            .check()?;
        Ok(())
    }
}

impl Deref for SurrealDbClient {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

/// Connects to the SurrealDB instance behind one seed target.
pub struct SurrealStoreProvider {
    connection: Connection,
    attempts: usize,
}

impl SurrealStoreProvider {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            attempts: 3,
        }
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }
}

#[async_trait]
impl StoreProvider for SurrealStoreProvider {
    async fn connect(&self) -> Result<Arc<dyn DocumentStore>, AppError> {
        let conn = &self.connection;
        if conn.address.trim().is_empty() {
            return Err(AppError::StoreInitialization(
                "no database address configured for this target".into(),
            ));
        }

        info!(
            address = %conn.address,
            namespace = %conn.namespace,
            database = %conn.database,
            "connecting to document store"
        );

        let retry_strategy = ExponentialBackoff::from_millis(100)
            .map(jitter)
            .take(self.attempts.saturating_sub(1));

        let db = Retry::spawn(retry_strategy, move || async move {
            SurrealDbClient::new(
                &conn.address,
                &conn.username,
                &conn.password,
                &conn.namespace,
                &conn.database,
            )
            .await
            .map_err(|err| {
                warn!(
                    address = %conn.address,
                    error = %err,
                    "document store connection attempt failed"
                );
                err
            })
        })
        .await
        .map_err(|err| AppError::StoreInitialization(format!("{}: {err}", conn.address)))?;

        Ok(Arc::new(db))
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl SurrealDbClient {
    /// Create an in-memory SurrealDB client for testing.
    pub async fn memory(namespace: &str, database: &str) -> Result<Self, Error> {
        let db = connect("mem://").await?;

        db.use_ns(namespace).use_db(database).await?;

        Ok(SurrealDbClient { client: db })
    }
}
