use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// MongoDB configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// MongoDB connection URI
    pub uri: String,
    /// Database name
    pub database: String,
    /// Username for authentication (optional)
    pub username: Option<String>,
    /// Password for authentication (optional)
    pub password: Option<String>,
    /// Collection name for clients (optional, defaults to `clients`)
    pub client_collection: Option<String>,
    /// Collection name for car listings (optional, defaults to `carlistings`)
    pub car_listing_collection: Option<String>,
    /// Collection name for appointments (optional, defaults to `appointments`)
    pub appointment_collection: Option<String>,
    /// Connection pool size
    pub pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
}

impl MongoConfig {
    /// Load MongoDB configuration from environment variables
    ///
    /// Expected environment variables:
    /// - MONGO_URI: MongoDB connection URI (required)
    /// - MONGO_DATABASE: Database name (required)
    /// - MONGO_CLIENT_COLLECTION: Collection name for clients (optional)
    /// - MONGO_CAR_LISTING_COLLECTION: Collection name for car listings (optional)
    /// - MONGO_APPOINTMENT_COLLECTION: Collection name for appointments (optional)
    /// - MONGO_POOL_SIZE: Connection pool size (defaults to 10)
    /// - MONGO_CONNECTION_TIMEOUT: Connection timeout in seconds (defaults to 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading MongoDB configuration from environment variables");

        let uri = env::var("MONGO_URI")
            .map_err(|_| {
                error!("MONGO_URI environment variable not found");
                ConfigError::EnvVarNotFound("MONGO_URI".to_string())
            })?;
        debug!("MongoDB URI: {}", uri);

        let database = env::var("MONGO_DATABASE")
            .map_err(|_| {
                error!("MONGO_DATABASE environment variable not found");
                ConfigError::EnvVarNotFound("MONGO_DATABASE".to_string())
            })?;
        debug!("MongoDB database: {}", database);

        let username = env::var("MONGO_USERNAME").ok();
        if let Some(ref user) = username {
            debug!("MongoDB username: {}", user);
        } else {
            debug!("No MongoDB username specified");
        }

        let password = env::var("MONGO_PASSWORD").ok();
        if let Some(_) = password {
            debug!("MongoDB password provided");
        } else {
            debug!("No MongoDB password specified");
        }

        let client_collection = Self::optional_collection("MONGO_CLIENT_COLLECTION");
        let car_listing_collection = Self::optional_collection("MONGO_CAR_LISTING_COLLECTION");
        let appointment_collection = Self::optional_collection("MONGO_APPOINTMENT_COLLECTION");

        let pool_size = env::var("MONGO_POOL_SIZE")
            .unwrap_or_else(|_| {
                warn!("MONGO_POOL_SIZE not set, using default: 10");
                "10".to_string()
            })
            .parse::<u32>()
            .map_err(|_| {
                error!("Invalid MONGO_POOL_SIZE value");
                ConfigError::InvalidValue("Invalid MONGO_POOL_SIZE value".to_string())
            })?;
        debug!("MongoDB pool size: {}", pool_size);

        let connection_timeout_secs = env::var("MONGO_CONNECTION_TIMEOUT")
            .unwrap_or_else(|_| {
                warn!("MONGO_CONNECTION_TIMEOUT not set, using default: 5 seconds");
                "5".to_string()
            })
            .parse::<u64>()
            .map_err(|_| {
                error!("Invalid MONGO_CONNECTION_TIMEOUT value");
                ConfigError::InvalidValue("Invalid MONGO_CONNECTION_TIMEOUT value".to_string())
            })?;
        debug!("MongoDB connection timeout: {} seconds", connection_timeout_secs);

        let config = MongoConfig {
            uri,
            database,
            username,
            password,
            client_collection,
            car_listing_collection,
            appointment_collection,
            pool_size,
            connection_timeout_secs,
        };

        config.validate()?;
        info!("MongoDB configuration loaded successfully");
        Ok(config)
    }

    /// Create MongoConfig for testing
    pub fn from_test_env() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "test_db".to_string(),
            username: Some("testuser".to_string()),
            password: Some("testpass".to_string()),
            client_collection: Some("test_clients".to_string()),
            car_listing_collection: Some("test_carlistings".to_string()),
            appointment_collection: Some("test_appointments".to_string()),
            pool_size: 2,
            connection_timeout_secs: 2,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        info!("Validating MongoDB configuration");

        if self.uri.is_empty() {
            error!("MongoDB URI is empty");
            return Err(ConfigError::ValidationError("MongoDB URI cannot be empty".to_string()));
        }

        if self.database.is_empty() {
            error!("MongoDB database is empty");
            return Err(ConfigError::ValidationError("MongoDB database cannot be empty".to_string()));
        }

        if self.pool_size == 0 {
            error!("MongoDB pool size is 0");
            return Err(ConfigError::ValidationError("MongoDB pool size must be greater than 0".to_string()));
        }

        if self.connection_timeout_secs == 0 {
            error!("MongoDB connection timeout is 0");
            return Err(ConfigError::ValidationError("MongoDB connection timeout must be greater than 0".to_string()));
        }

        // Optionally validate username/password if present
        if let Some(ref user) = self.username {
            if user.is_empty() {
                error!("MongoDB username is empty");
                return Err(ConfigError::ValidationError("MongoDB username cannot be empty if set".to_string()));
            }
        }
        if let Some(ref pass) = self.password {
            if pass.is_empty() {
                error!("MongoDB password is empty");
                return Err(ConfigError::ValidationError("MongoDB password cannot be empty if set".to_string()));
            }
        }
        for name in [&self.client_collection, &self.car_listing_collection, &self.appointment_collection].into_iter().flatten() {
            if name.is_empty() {
                error!("MongoDB collection name is empty");
                return Err(ConfigError::ValidationError("MongoDB collection names cannot be empty if set".to_string()));
            }
        }
        info!("MongoDB configuration validation successful");
        Ok(())
    }

    /// Get the MongoDB connection URI
    pub fn get_uri(&self) -> &str {
        &self.uri
    }

    /// Get the database name
    pub fn get_database(&self) -> &str {
        &self.database
    }

    pub fn client_collection(&self) -> &str {
        self.client_collection.as_deref().unwrap_or("clients")
    }

    pub fn car_listing_collection(&self) -> &str {
        self.car_listing_collection.as_deref().unwrap_or("carlistings")
    }

    pub fn appointment_collection(&self) -> &str {
        self.appointment_collection.as_deref().unwrap_or("appointments")
    }

    fn optional_collection(var: &str) -> Option<String> {
        let name = env::var(var).ok();
        match name {
            Some(ref coll) => debug!("{}: {}", var, coll),
            None => debug!("{} not set, using default collection", var),
        }
        name
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "car_rental".to_string(),
            username: None,
            password: None,
            client_collection: None,
            car_listing_collection: None,
            appointment_collection: None,
            pool_size: 10,
            connection_timeout_secs: 5,
        }
    }
}
