pub mod appointment_repo;
pub mod car_listing_repo;
pub mod client_repo;
pub mod database;
pub mod repository_error;
