use bson::{doc, Document};
use mongodb::options::{ClientOptions, Credential, IndexOptions, ResolverConfig};
use mongodb::{Client, Database, IndexModel};
use tracing::{info, instrument};

use crate::config::mongo_conf::MongoConfig;
use crate::repository::repository_error::RepositoryResult;

/// Opens the shared MongoDB client. Every repository borrows its collections
/// from this one pooled client.
pub async fn connect(config: &MongoConfig) -> Result<Client, mongodb::error::Error> {
    let mut client_options = ClientOptions::parse_with_resolver_config(config.get_uri(), ResolverConfig::cloudflare()).await?;
    client_options.app_name = Some("CarRentalBackend".to_string());
    client_options.max_pool_size = Some(config.pool_size);
    client_options.connect_timeout = Some(std::time::Duration::from_secs(config.connection_timeout_secs));

    if let (Some(ref username), Some(ref password)) = (&config.username, &config.password) {
        client_options.credential = Some(Credential::builder()
            .username(username.clone())
            .password(password.clone())
            .build());
    }

    Client::with_options(client_options)
}

fn unique_index(keys: Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

fn plain_index(keys: Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

/// Creates the indexes the lookups and the overlap query rely on.
/// Creating an index that already exists is a no-op on the server.
#[instrument(skip(db, config), fields(database = %config.database))]
pub async fn ensure_indexes(db: &Database, config: &MongoConfig) -> RepositoryResult<()> {
    info!("Ensuring MongoDB indexes");

    db.collection::<Document>(config.client_collection())
        .create_index(unique_index(doc! { "email": 1 }), None)
        .await?;

    db.collection::<Document>(config.car_listing_collection())
        .create_index(unique_index(doc! { "licensePlate": 1 }), None)
        .await?;

    let appointments = db.collection::<Document>(config.appointment_collection());
    appointments
        .create_indexes(
            vec![
                plain_index(doc! { "carListing": 1, "status": 1, "dateInformation.appointmentDate": 1 }),
                plain_index(doc! { "rentee": 1 }),
                plain_index(doc! { "location.meetupLocation": "2dsphere" }),
                plain_index(doc! { "location.dropoffLocation": "2dsphere" }),
            ],
            None,
        )
        .await?;

    info!("MongoDB indexes are in place");
    Ok(())
}
