use crate::model::car_listing::CarListingDocument;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use crate::config::mongo_conf::MongoConfig;
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use tracing::{debug, error, info};

#[async_trait]
pub trait CarListingRepository: Send + Sync {
    async fn insert(&self, listing: CarListingDocument) -> RepositoryResult<CarListingDocument>;
    async fn find_by_license_plate(&self, plate: &str) -> RepositoryResult<Option<CarListingDocument>>;
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<CarListingDocument>>;
}

pub struct MongoCarListingRepository {
    collection: mongodb::Collection<CarListingDocument>,
}

impl MongoCarListingRepository {
    pub fn new(db: &mongodb::Database, config: &MongoConfig) -> Self {
        let collection = db.collection::<CarListingDocument>(config.car_listing_collection());
        MongoCarListingRepository { collection }
    }
}

#[async_trait]
impl CarListingRepository for MongoCarListingRepository {
    #[tracing::instrument(skip(self, listing), fields(license_plate = %listing.license_plate))]
    async fn insert(&self, mut listing: CarListingDocument) -> RepositoryResult<CarListingDocument> {
        info!("Inserting car listing");
        listing.id = Some(ObjectId::new());
        match self.collection.insert_one(&listing, None).await {
            Ok(_) => Ok(listing),
            Err(e) => {
                error!("Failed to insert car listing: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_license_plate(&self, plate: &str) -> RepositoryResult<Option<CarListingDocument>> {
        let filter = doc! { "licensePlate": plate };
        let listing = self.collection.find_one(filter, None).await
            .map_err(|e| {
                error!("Failed to find car listing by plate: {}", e);
                RepositoryError::from(e)
            })?;
        debug!(found = listing.is_some(), "Car listing lookup by license plate");
        Ok(listing)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<CarListingDocument>> {
        let filter = doc! { "_id": *id };
        let listing = self.collection.find_one(filter, None).await
            .map_err(|e| {
                error!("Failed to find car listing by id: {}", e);
                RepositoryError::from(e)
            })?;
        Ok(listing)
    }
}
