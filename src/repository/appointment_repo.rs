use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use tracing::{debug, error, info, warn};

use crate::config::mongo_conf::MongoConfig;
use crate::model::appointment::{
    make_appointment, Appointment, AppointmentStatus, AppointmentUpdateFields, DateInformation,
};
use crate::model::appointment_document::{AppointmentDocument, MILLIS_PER_DAY};
use crate::model::car_listing::{make_car_listing, CarListingDocument};
use crate::model::client::make_client;
use crate::model::domain_error::DomainError;
use crate::repository::car_listing_repo::CarListingRepository;
use crate::repository::client_repo::ClientRepository;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

/// Why a stored appointment could not be turned back into a domain object.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReassemblyError {
    #[error("rentee {0} no longer exists")]
    RenteeMissing(ObjectId),
    #[error("car listing {0} no longer exists")]
    ListingMissing(ObjectId),
    #[error("car listing with plate {0} no longer resolves")]
    PlateUnresolved(String),
    #[error("stored appointment is invalid: {0}")]
    Invalid(#[from] DomainError),
}

#[derive(Debug)]
pub enum UpdateOutcome {
    NotFound,
    Updated(Appointment),
    /// The write went through but the result could not be rebuilt. The write
    /// is not rolled back.
    ReassemblyFailed {
        appointment_number: ObjectId,
        reason: ReassemblyError,
    },
}

#[derive(Debug)]
pub enum BookingOutcome {
    Booked(Appointment),
    /// The rentee email or the license plate did not resolve.
    Unresolved,
    /// An accepted appointment already occupies part of the requested period.
    Overlap,
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Persists `appointment` and returns it with `appointment_number` set.
    /// `None` when the rentee or the listing cannot be resolved.
    async fn create_appointment(&self, appointment: Appointment) -> RepositoryResult<Option<Appointment>>;

    /// Whether an accepted appointment on `listing_plate` intersects
    /// `[date, date + days)`. Fails with `NotFound` for an unknown plate.
    async fn overlap_exists(&self, date: DateTime<Utc>, days: u32, listing_plate: &str) -> RepositoryResult<bool>;

    /// Same as [`overlap_exists`](Self::overlap_exists), ignoring one appointment.
    async fn overlap_exists_excluding(
        &self,
        date: DateTime<Utc>,
        days: u32,
        listing_plate: &str,
        exclude: &ObjectId,
    ) -> RepositoryResult<bool>;

    async fn update_appointment(
        &self,
        appointment_number: &ObjectId,
        fields: AppointmentUpdateFields,
    ) -> RepositoryResult<UpdateOutcome>;

    async fn find_by_appointment_number(&self, appointment_number: &ObjectId) -> RepositoryResult<Option<Appointment>>;

    /// Overlap check and insert as one transaction.
    async fn book_appointment(&self, appointment: Appointment) -> RepositoryResult<BookingOutcome>;
}

/// Aggregation matching accepted appointments of `listing_id` that intersect
/// `[start, end)`. At most one document comes back.
pub fn overlap_pipeline(
    listing_id: &ObjectId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<&ObjectId>,
) -> Vec<Document> {
    let mut first_match = doc! {
        "carListing": *listing_id,
        "status": AppointmentStatus::Accepted.as_str(),
    };
    if let Some(id) = exclude {
        first_match.insert("_id", doc! { "$ne": *id });
    }

    vec![
        doc! { "$match": first_match },
        doc! {
            "$project": {
                "_id": 1,
                "status": 1,
                "carListing": 1,
                "startDate": "$dateInformation.appointmentDate",
                "endDate": {
                    "$add": [
                        "$dateInformation.appointmentDate",
                        { "$multiply": ["$dateInformation.days", MILLIS_PER_DAY] }
                    ]
                },
            }
        },
        doc! {
            "$match": {
                "startDate": { "$lt": bson::DateTime::from_chrono(end) },
                "endDate": { "$gt": bson::DateTime::from_chrono(start) },
            }
        },
        doc! { "$limit": 1 },
    ]
}

pub struct MongoAppointmentRepository {
    client: mongodb::Client,
    collection: mongodb::Collection<AppointmentDocument>,
    listings: mongodb::Collection<CarListingDocument>,
    clients: Arc<dyn ClientRepository>,
    car_listings: Arc<dyn CarListingRepository>,
}

impl MongoAppointmentRepository {
    pub fn new(
        client: mongodb::Client,
        config: &MongoConfig,
        clients: Arc<dyn ClientRepository>,
        car_listings: Arc<dyn CarListingRepository>,
    ) -> Self {
        let db = client.database(&config.database);
        let collection = db.collection::<AppointmentDocument>(config.appointment_collection());
        let listings = db.collection::<CarListingDocument>(config.car_listing_collection());
        MongoAppointmentRepository {
            client,
            collection,
            listings,
            clients,
            car_listings,
        }
    }

    /// Resolves rentee email and listing plate to stored ids.
    async fn resolve_references(&self, appointment: &Appointment) -> RepositoryResult<Option<(ObjectId, ObjectId)>> {
        let rentee = self.clients.find_by_email(&appointment.rentee.email).await?;
        let listing = self
            .car_listings
            .find_by_license_plate(&appointment.car_listing.license_plate)
            .await?;

        match (rentee.and_then(|r| r.id), listing.and_then(|l| l.id)) {
            (Some(rentee_id), Some(listing_id)) => Ok(Some((rentee_id, listing_id))),
            (rentee_id, listing_id) => {
                warn!(
                    rentee_found = rentee_id.is_some(),
                    listing_found = listing_id.is_some(),
                    email = %appointment.rentee.email,
                    license_plate = %appointment.car_listing.license_plate,
                    "Appointment references do not resolve"
                );
                Ok(None)
            }
        }
    }

    async fn listing_id_for_plate(&self, plate: &str) -> RepositoryResult<ObjectId> {
        self.car_listings
            .find_by_license_plate(plate)
            .await?
            .and_then(|listing| listing.id)
            .ok_or_else(|| RepositoryError::not_found(format!("Car listing not found for plate: {}", plate)))
    }

    async fn first_overlap(&self, pipeline: Vec<Document>) -> RepositoryResult<bool> {
        let mut cursor = self.collection.aggregate(pipeline, None).await.map_err(|e| {
            error!("Failed to run overlap aggregation: {}", e);
            RepositoryError::from(e)
        })?;
        Ok(cursor.next().await.transpose()?.is_some())
    }

    /// Rebuilds the domain appointment from a stored document: the rentee by
    /// its stored id, the listing by its stored id and then by plate.
    async fn reassemble(&self, document: AppointmentDocument) -> RepositoryResult<Result<Appointment, ReassemblyError>> {
        let Some(rentee) = self.clients.find_by_id(&document.rentee).await? else {
            return Ok(Err(ReassemblyError::RenteeMissing(document.rentee)));
        };
        let Some(listing_ref) = self.car_listings.find_by_id(&document.car_listing).await? else {
            return Ok(Err(ReassemblyError::ListingMissing(document.car_listing)));
        };
        let Some(listing) = self.car_listings.find_by_license_plate(&listing_ref.license_plate).await? else {
            return Ok(Err(ReassemblyError::PlateUnresolved(listing_ref.license_plate)));
        };

        let built = make_client(rentee.into())
            .and_then(|rentee| Ok((rentee, make_car_listing(listing.into())?)))
            .and_then(|(rentee, listing)| document.into_draft(rentee, listing))
            .and_then(make_appointment);
        Ok(built.map_err(ReassemblyError::from))
    }

    async fn book_in_transaction(
        &self,
        session: &mut mongodb::ClientSession,
        mut appointment: Appointment,
        end: DateTime<Utc>,
        rentee_id: ObjectId,
        listing_id: ObjectId,
    ) -> RepositoryResult<BookingOutcome> {
        // Every booking on this listing writes the listing document, so two
        // concurrent bookings conflict instead of both passing the check.
        self.listings
            .update_one_with_session(
                doc! { "_id": listing_id },
                doc! { "$inc": { "bookingVersion": 1_i64 } },
                None,
                session,
            )
            .await?;

        let start = appointment.date_information.appointment_date;
        let pipeline = overlap_pipeline(&listing_id, start, end, None);
        let overlapping = {
            let mut cursor = self.collection.aggregate_with_session(pipeline, None, session).await?;
            cursor.next(session).await.transpose()?.is_some()
        };
        if overlapping {
            info!("Requested period overlaps an accepted appointment");
            session.abort_transaction().await?;
            return Ok(BookingOutcome::Overlap);
        }

        let id = ObjectId::new();
        let mut document = AppointmentDocument::new(&appointment, rentee_id, listing_id);
        document.id = Some(id);
        self.collection.insert_one_with_session(&document, None, session).await?;
        session.commit_transaction().await?;

        appointment.appointment_number = Some(id);
        Ok(BookingOutcome::Booked(appointment))
    }

    async fn overlap_for_plate(
        &self,
        date: DateTime<Utc>,
        days: u32,
        listing_plate: &str,
        exclude: Option<&ObjectId>,
    ) -> RepositoryResult<bool> {
        let end = DateInformation::new(date, days).end_date()?;
        let listing_id = self.listing_id_for_plate(listing_plate).await?;
        let pipeline = overlap_pipeline(&listing_id, date, end, exclude);
        let overlapping = self.first_overlap(pipeline).await?;
        debug!(overlapping, "Overlap check finished");
        Ok(overlapping)
    }
}

#[async_trait]
impl AppointmentRepository for MongoAppointmentRepository {
    #[tracing::instrument(skip(self, appointment), fields(
        email = %appointment.rentee.email,
        license_plate = %appointment.car_listing.license_plate
    ))]
    async fn create_appointment(&self, mut appointment: Appointment) -> RepositoryResult<Option<Appointment>> {
        info!("Creating appointment");
        let Some((rentee_id, listing_id)) = self.resolve_references(&appointment).await? else {
            return Ok(None);
        };

        let id = ObjectId::new();
        let mut document = AppointmentDocument::new(&appointment, rentee_id, listing_id);
        document.id = Some(id);

        match self.collection.insert_one(&document, None).await {
            Ok(_) => {
                info!(appointment_number = %id, "Appointment created");
                appointment.appointment_number = Some(id);
                Ok(Some(appointment))
            }
            Err(e) => {
                error!("Failed to create appointment: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(date = %date))]
    async fn overlap_exists(&self, date: DateTime<Utc>, days: u32, listing_plate: &str) -> RepositoryResult<bool> {
        self.overlap_for_plate(date, days, listing_plate, None).await
    }

    #[tracing::instrument(skip(self), fields(date = %date, exclude = %exclude))]
    async fn overlap_exists_excluding(
        &self,
        date: DateTime<Utc>,
        days: u32,
        listing_plate: &str,
        exclude: &ObjectId,
    ) -> RepositoryResult<bool> {
        self.overlap_for_plate(date, days, listing_plate, Some(exclude)).await
    }

    #[tracing::instrument(skip(self, fields), fields(appointment_number = %appointment_number, changes = ?fields))]
    async fn update_appointment(
        &self,
        appointment_number: &ObjectId,
        fields: AppointmentUpdateFields,
    ) -> RepositoryResult<UpdateOutcome> {
        info!("Updating appointment");
        let filter = doc! { "_id": *appointment_number };
        let Some(mut document) = self.collection.find_one(filter.clone(), None).await? else {
            info!("Appointment not found");
            return Ok(UpdateOutcome::NotFound);
        };

        for change in fields.into_changes() {
            document.apply(change);
        }

        let mut merged = bson::to_document(&document)?;
        merged.remove("_id");
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(filter, doc! { "$set": merged }, options)
            .await
            .map_err(|e| {
                error!("Failed to update appointment: {}", e);
                RepositoryError::from(e)
            })?;

        // deleted between the read and the write
        let Some(updated) = updated else {
            warn!("Appointment disappeared during update");
            return Ok(UpdateOutcome::NotFound);
        };

        match self.reassemble(updated).await? {
            Ok(appointment) => {
                info!("Appointment updated");
                Ok(UpdateOutcome::Updated(appointment))
            }
            Err(reason) => {
                error!(%reason, "Appointment updated but could not be reassembled");
                Ok(UpdateOutcome::ReassemblyFailed {
                    appointment_number: *appointment_number,
                    reason,
                })
            }
        }
    }

    #[tracing::instrument(skip(self), fields(appointment_number = %appointment_number))]
    async fn find_by_appointment_number(&self, appointment_number: &ObjectId) -> RepositoryResult<Option<Appointment>> {
        let filter = doc! { "_id": *appointment_number };
        let Some(document) = self.collection.find_one(filter, None).await? else {
            return Ok(None);
        };
        match self.reassemble(document).await? {
            Ok(appointment) => Ok(Some(appointment)),
            Err(reason) => {
                error!(%reason, "Stored appointment could not be reassembled");
                Err(RepositoryError::validation(reason.to_string()))
            }
        }
    }

    #[tracing::instrument(skip(self, appointment), fields(
        email = %appointment.rentee.email,
        license_plate = %appointment.car_listing.license_plate
    ))]
    async fn book_appointment(&self, appointment: Appointment) -> RepositoryResult<BookingOutcome> {
        info!("Booking appointment");
        let end = appointment.date_information.end_date()?;
        let Some((rentee_id, listing_id)) = self.resolve_references(&appointment).await? else {
            return Ok(BookingOutcome::Unresolved);
        };

        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        // an error mid-transaction drops the session, which aborts it
        let outcome = self
            .book_in_transaction(&mut session, appointment, end, rentee_id, listing_id)
            .await;
        match &outcome {
            Ok(BookingOutcome::Booked(booked)) => {
                info!(appointment_number = ?booked.appointment_number, "Appointment booked");
            }
            Ok(_) => {}
            Err(e) => error!("Booking transaction failed: {}", e),
        }
        outcome
    }
}
