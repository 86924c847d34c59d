use crate::model::client::ClientDocument;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use crate::config::mongo_conf::MongoConfig;
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use tracing::{debug, error, info};

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn insert(&self, client: ClientDocument) -> RepositoryResult<ClientDocument>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<ClientDocument>>;
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<ClientDocument>>;
}

pub struct MongoClientRepository {
    collection: mongodb::Collection<ClientDocument>,
}

impl MongoClientRepository {
    pub fn new(db: &mongodb::Database, config: &MongoConfig) -> Self {
        let collection = db.collection::<ClientDocument>(config.client_collection());
        MongoClientRepository { collection }
    }
}

#[async_trait]
impl ClientRepository for MongoClientRepository {
    #[tracing::instrument(skip(self, client), fields(email = %client.email))]
    async fn insert(&self, mut client: ClientDocument) -> RepositoryResult<ClientDocument> {
        info!("Inserting client");
        client.id = Some(ObjectId::new());
        match self.collection.insert_one(&client, None).await {
            Ok(_) => Ok(client),
            Err(e) => {
                error!("Failed to insert client: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<ClientDocument>> {
        let filter = doc! { "email": email };
        let client = self.collection.find_one(filter, None).await
            .map_err(|e| {
                error!("Failed to find client by email: {}", e);
                RepositoryError::from(e)
            })?;
        debug!(found = client.is_some(), "Client lookup by email");
        Ok(client)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<ClientDocument>> {
        let filter = doc! { "_id": *id };
        let client = self.collection.find_one(filter, None).await
            .map_err(|e| {
                error!("Failed to find client by id: {}", e);
                RepositoryError::from(e)
            })?;
        Ok(client)
    }
}
