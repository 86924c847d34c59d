#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, TimeZone, Utc};

use car_rental_backend::model::{
    make_appointment, make_car_listing, make_client, Appointment, AppointmentDocument,
    AppointmentLocation, AppointmentStatus, AppointmentUpdateFields, CarListing,
    CarListingDocument, Client, ClientDocument, DateInformation, GeoPoint,
};
use car_rental_backend::repository::appointment_repo::{
    AppointmentRepository, BookingOutcome, ReassemblyError, UpdateOutcome,
};
use car_rental_backend::repository::car_listing_repo::CarListingRepository;
use car_rental_backend::repository::client_repo::ClientRepository;
use car_rental_backend::repository::repository_error::{RepositoryError, RepositoryResult};

pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn client(email: &str) -> Client {
    Client {
        name: "Lola Perez".to_string(),
        email: email.to_string(),
        date_of_birth: day(1990, 2, 3),
        is_verified: true,
        image: None,
        drivers_license: Some("PR-1234567".to_string()),
        cell_number: "787-675-5439".to_string(),
    }
}

pub fn listing(plate: &str) -> CarListing {
    CarListing {
        license_plate: plate.to_string(),
        brand: "Toyota".to_string(),
        model: "Corolla".to_string(),
        year: 2019,
        price_per_day: 45.0,
    }
}

pub fn appointment(email: &str, plate: &str, start: DateTime<Utc>, days: u32, status: AppointmentStatus) -> Appointment {
    Appointment {
        appointment_number: None,
        rentee: client(email),
        car_listing: listing(plate),
        status,
        date_information: DateInformation::new(start, days),
        location: AppointmentLocation {
            meetup_location: GeoPoint::new(18.2, -66.5, "X"),
            dropoff_location: GeoPoint::new(18.44, -66.0, "SJU Airport"),
        },
        post_accept_information: None,
    }
}

#[derive(Default)]
pub struct InMemoryClients {
    docs: Mutex<Vec<ClientDocument>>,
}

impl InMemoryClients {
    pub fn remove_by_email(&self, email: &str) {
        self.docs.lock().unwrap().retain(|c| c.email != email);
    }
}

#[async_trait]
impl ClientRepository for InMemoryClients {
    async fn insert(&self, mut client: ClientDocument) -> RepositoryResult<ClientDocument> {
        let mut docs = self.docs.lock().unwrap();
        if docs.iter().any(|c| c.email == client.email) {
            return Err(RepositoryError::already_exists(format!("Duplicate key: {}", client.email)));
        }
        client.id = Some(ObjectId::new());
        docs.push(client.clone());
        Ok(client)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<ClientDocument>> {
        Ok(self.docs.lock().unwrap().iter().find(|c| c.email == email).cloned())
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<ClientDocument>> {
        Ok(self.docs.lock().unwrap().iter().find(|c| c.id.as_ref() == Some(id)).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCarListings {
    docs: Mutex<Vec<CarListingDocument>>,
}

#[async_trait]
impl CarListingRepository for InMemoryCarListings {
    async fn insert(&self, mut listing: CarListingDocument) -> RepositoryResult<CarListingDocument> {
        let mut docs = self.docs.lock().unwrap();
        if docs.iter().any(|l| l.license_plate == listing.license_plate) {
            return Err(RepositoryError::already_exists(format!("Duplicate key: {}", listing.license_plate)));
        }
        listing.id = Some(ObjectId::new());
        docs.push(listing.clone());
        Ok(listing)
    }

    async fn find_by_license_plate(&self, plate: &str) -> RepositoryResult<Option<CarListingDocument>> {
        Ok(self.docs.lock().unwrap().iter().find(|l| l.license_plate == plate).cloned())
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<CarListingDocument>> {
        Ok(self.docs.lock().unwrap().iter().find(|l| l.id.as_ref() == Some(id)).cloned())
    }
}

/// Appointment store over plain vectors, following the same document
/// translation as the MongoDB repository.
pub struct InMemoryAppointments {
    pub clients: Arc<InMemoryClients>,
    pub car_listings: Arc<InMemoryCarListings>,
    docs: Mutex<Vec<AppointmentDocument>>,
}

impl InMemoryAppointments {
    pub fn new() -> Self {
        InMemoryAppointments {
            clients: Arc::new(InMemoryClients::default()),
            car_listings: Arc::new(InMemoryCarListings::default()),
            docs: Mutex::new(Vec::new()),
        }
    }

    pub async fn seed(&self, emails: &[&str], plates: &[&str]) {
        for email in emails {
            self.clients.insert(ClientDocument::from(&client(email))).await.unwrap();
        }
        for plate in plates {
            self.car_listings.insert(CarListingDocument::from(&listing(plate))).await.unwrap();
        }
    }

    pub fn stored(&self, id: &ObjectId) -> Option<AppointmentDocument> {
        self.docs.lock().unwrap().iter().find(|d| d.id.as_ref() == Some(id)).cloned()
    }

    pub fn count(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    async fn resolve(&self, appointment: &Appointment) -> RepositoryResult<Option<(ObjectId, ObjectId)>> {
        let rentee = self.clients.find_by_email(&appointment.rentee.email).await?.and_then(|c| c.id);
        let listing = self
            .car_listings
            .find_by_license_plate(&appointment.car_listing.license_plate)
            .await?
            .and_then(|l| l.id);
        Ok(rentee.zip(listing))
    }

    fn overlaps(&self, listing_id: &ObjectId, candidate: &DateInformation, exclude: Option<&ObjectId>) -> bool {
        self.docs.lock().unwrap().iter().any(|d| {
            d.car_listing == *listing_id
                && d.status.blocks_schedule()
                && d.id.as_ref() != exclude
                && d.date_information().map(|r| r.overlaps(candidate)).unwrap_or(false)
        })
    }

    async fn listing_id(&self, plate: &str) -> RepositoryResult<ObjectId> {
        self.car_listings
            .find_by_license_plate(plate)
            .await?
            .and_then(|l| l.id)
            .ok_or_else(|| RepositoryError::not_found(format!("Car listing not found for plate: {}", plate)))
    }

    async fn reassemble(&self, doc: AppointmentDocument) -> RepositoryResult<Result<Appointment, ReassemblyError>> {
        let Some(rentee) = self.clients.find_by_id(&doc.rentee).await? else {
            return Ok(Err(ReassemblyError::RenteeMissing(doc.rentee)));
        };
        let Some(listing) = self.car_listings.find_by_id(&doc.car_listing).await? else {
            return Ok(Err(ReassemblyError::ListingMissing(doc.car_listing)));
        };
        let built = make_client(rentee.into()).and_then(|rentee| {
            let listing = make_car_listing(listing.into())?;
            make_appointment(doc.into_draft(rentee, listing)?)
        });
        Ok(built.map_err(ReassemblyError::from))
    }

    fn insert(&self, appointment: &mut Appointment, rentee: ObjectId, listing: ObjectId) {
        let id = ObjectId::new();
        let mut doc = AppointmentDocument::new(appointment, rentee, listing);
        doc.id = Some(id);
        self.docs.lock().unwrap().push(doc);
        appointment.appointment_number = Some(id);
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointments {
    async fn create_appointment(&self, mut appointment: Appointment) -> RepositoryResult<Option<Appointment>> {
        let Some((rentee, listing)) = self.resolve(&appointment).await? else {
            return Ok(None);
        };
        self.insert(&mut appointment, rentee, listing);
        Ok(Some(appointment))
    }

    async fn overlap_exists(&self, date: DateTime<Utc>, days: u32, listing_plate: &str) -> RepositoryResult<bool> {
        DateInformation::new(date, days).end_date()?;
        let listing = self.listing_id(listing_plate).await?;
        Ok(self.overlaps(&listing, &DateInformation::new(date, days), None))
    }

    async fn overlap_exists_excluding(
        &self,
        date: DateTime<Utc>,
        days: u32,
        listing_plate: &str,
        exclude: &ObjectId,
    ) -> RepositoryResult<bool> {
        DateInformation::new(date, days).end_date()?;
        let listing = self.listing_id(listing_plate).await?;
        Ok(self.overlaps(&listing, &DateInformation::new(date, days), Some(exclude)))
    }

    async fn update_appointment(
        &self,
        appointment_number: &ObjectId,
        fields: AppointmentUpdateFields,
    ) -> RepositoryResult<UpdateOutcome> {
        let updated = {
            let mut docs = self.docs.lock().unwrap();
            let Some(doc) = docs.iter_mut().find(|d| d.id.as_ref() == Some(appointment_number)) else {
                return Ok(UpdateOutcome::NotFound);
            };
            for change in fields.into_changes() {
                doc.apply(change);
            }
            doc.clone()
        };
        Ok(match self.reassemble(updated).await? {
            Ok(appointment) => UpdateOutcome::Updated(appointment),
            Err(reason) => UpdateOutcome::ReassemblyFailed {
                appointment_number: *appointment_number,
                reason,
            },
        })
    }

    async fn find_by_appointment_number(&self, appointment_number: &ObjectId) -> RepositoryResult<Option<Appointment>> {
        let Some(doc) = self.stored(appointment_number) else {
            return Ok(None);
        };
        match self.reassemble(doc).await? {
            Ok(appointment) => Ok(Some(appointment)),
            Err(reason) => Err(RepositoryError::validation(reason.to_string())),
        }
    }

    async fn book_appointment(&self, mut appointment: Appointment) -> RepositoryResult<BookingOutcome> {
        appointment.date_information.end_date()?;
        let Some((rentee, listing)) = self.resolve(&appointment).await? else {
            return Ok(BookingOutcome::Unresolved);
        };
        if self.overlaps(&listing, &appointment.date_information, None) {
            return Ok(BookingOutcome::Overlap);
        }
        self.insert(&mut appointment, rentee, listing);
        Ok(BookingOutcome::Booked(appointment))
    }
}
