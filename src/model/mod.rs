pub mod appointment;
pub mod appointment_document;
pub mod car_listing;
pub mod client;
pub mod domain_error;
pub mod geo;

pub use appointment::{
    make_appointment, Appointment, AppointmentChange, AppointmentDraft, AppointmentLocation,
    AppointmentStatus, AppointmentUpdateFields, DateInformation, PostAcceptInformation,
    Transaction,
};
pub use appointment_document::AppointmentDocument;
pub use car_listing::{make_car_listing, CarListing, CarListingDocument, CarListingDraft};
pub use client::{make_client, Client, ClientDocument, ClientDraft};
pub use domain_error::DomainError;
pub use geo::{GeoJsonPoint, GeoPoint};
