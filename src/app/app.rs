use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::{BookingConfig, MongoConfig};
use crate::repository::appointment_repo::MongoAppointmentRepository;
use crate::repository::car_listing_repo::{CarListingRepository, MongoCarListingRepository};
use crate::repository::client_repo::{ClientRepository, MongoClientRepository};
use crate::repository::database;
use crate::service::appointment_service::AppointmentServiceImpl;

/// Wires configuration, the MongoDB connection, the repositories and the
/// appointment service together.
pub struct App {
    mongo_config: MongoConfig,
    database: mongodb::Database,
    pub client_repo: Arc<MongoClientRepository>,
    pub car_listing_repo: Arc<MongoCarListingRepository>,
    pub appointment_service: Arc<AppointmentServiceImpl>,
}

impl App {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let mongo_config = MongoConfig::from_env()?;
        let booking_config = BookingConfig::from_env()?;
        Self::with_config(mongo_config, booking_config).await
    }

    pub async fn with_config(
        mongo_config: MongoConfig,
        booking_config: BookingConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let client = database::connect(&mongo_config).await?;
        let database = client.database(mongo_config.get_database());

        let client_repo = Arc::new(MongoClientRepository::new(&database, &mongo_config));
        let car_listing_repo = Arc::new(MongoCarListingRepository::new(&database, &mongo_config));
        let appointment_repo = Arc::new(MongoAppointmentRepository::new(
            client,
            &mongo_config,
            client_repo.clone() as Arc<dyn ClientRepository>,
            car_listing_repo.clone() as Arc<dyn CarListingRepository>,
        ));
        let appointment_service = Arc::new(AppointmentServiceImpl::new(appointment_repo, booking_config));

        Ok(App {
            mongo_config,
            database,
            client_repo,
            car_listing_repo,
            appointment_service,
        })
    }

    /// Prepares the database for serving: indexes used by the lookups and
    /// the overlap query.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        database::ensure_indexes(&self.database, &self.mongo_config).await?;
        info!(
            database = %self.mongo_config.get_database(),
            clients = %self.mongo_config.client_collection(),
            car_listings = %self.mongo_config.car_listing_collection(),
            appointments = %self.mongo_config.appointment_collection(),
            "Car rental backend is ready"
        );
        Ok(())
    }
}
