use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::model::appointment::{
    Appointment, AppointmentChange, AppointmentDraft, AppointmentLocation, AppointmentStatus,
    DateInformation, PostAcceptInformation, Transaction,
};
use crate::model::car_listing::CarListing;
use crate::model::client::Client;
use crate::model::domain_error::DomainError;
use crate::model::geo::{GeoJsonPoint, GeoPoint};

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Stored shape of an appointment. Rentee and listing are referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub rentee: ObjectId,
    pub car_listing: ObjectId,
    pub status: AppointmentStatus,
    pub date_information: DateInformationDocument,
    pub location: LocationDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_accept_information: Option<PostAcceptDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateInformationDocument {
    pub appointment_date: bson::DateTime,
    pub days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDocument {
    pub meetup_location: GeoJsonPoint,
    pub dropoff_location: GeoJsonPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAcceptDocument {
    pub date_accepted: Option<bson::DateTime>,
    #[serde(default)]
    pub transactions: Vec<TransactionDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDocument {
    pub transaction_id: String,
    pub amount: f64,
    pub created_at: bson::DateTime,
}

impl From<&DateInformation> for DateInformationDocument {
    fn from(dates: &DateInformation) -> Self {
        DateInformationDocument {
            appointment_date: bson::DateTime::from_chrono(dates.appointment_date),
            days: i64::from(dates.days),
        }
    }
}

impl TryFrom<&DateInformationDocument> for DateInformation {
    type Error = DomainError;

    fn try_from(doc: &DateInformationDocument) -> Result<Self, Self::Error> {
        let days = u32::try_from(doc.days)
            .map_err(|_| DomainError::invalid_field("days", format!("{} is not a day count", doc.days)))?;
        Ok(DateInformation::new(doc.appointment_date.to_chrono(), days))
    }
}

impl From<&AppointmentLocation> for LocationDocument {
    fn from(location: &AppointmentLocation) -> Self {
        LocationDocument {
            meetup_location: GeoJsonPoint::from(&location.meetup_location),
            dropoff_location: GeoJsonPoint::from(&location.dropoff_location),
        }
    }
}

impl From<&LocationDocument> for AppointmentLocation {
    fn from(doc: &LocationDocument) -> Self {
        AppointmentLocation {
            meetup_location: GeoPoint::from(&doc.meetup_location),
            dropoff_location: GeoPoint::from(&doc.dropoff_location),
        }
    }
}

impl From<&PostAcceptInformation> for PostAcceptDocument {
    fn from(info: &PostAcceptInformation) -> Self {
        PostAcceptDocument {
            date_accepted: info.date_accepted.map(bson::DateTime::from_chrono),
            transactions: info
                .transactions
                .iter()
                .map(|t| TransactionDocument {
                    transaction_id: t.transaction_id.clone(),
                    amount: t.amount,
                    created_at: bson::DateTime::from_chrono(t.created_at),
                })
                .collect(),
        }
    }
}

impl From<&PostAcceptDocument> for PostAcceptInformation {
    fn from(doc: &PostAcceptDocument) -> Self {
        PostAcceptInformation {
            date_accepted: doc.date_accepted.map(|d| d.to_chrono()),
            transactions: doc
                .transactions
                .iter()
                .map(|t| Transaction {
                    transaction_id: t.transaction_id.clone(),
                    amount: t.amount,
                    created_at: t.created_at.to_chrono(),
                })
                .collect(),
        }
    }
}

impl AppointmentDocument {
    /// Builds the document for a new appointment whose rentee and listing
    /// were already resolved to their ids.
    pub fn new(appointment: &Appointment, rentee: ObjectId, car_listing: ObjectId) -> Self {
        AppointmentDocument {
            id: None,
            rentee,
            car_listing,
            status: appointment.status,
            date_information: DateInformationDocument::from(&appointment.date_information),
            location: LocationDocument::from(&appointment.location),
            post_accept_information: appointment
                .post_accept_information
                .as_ref()
                .map(PostAcceptDocument::from),
        }
    }

    pub fn apply(&mut self, change: AppointmentChange) {
        match change {
            AppointmentChange::Status(status) => self.status = status,
            AppointmentChange::Date(date) => {
                self.date_information.appointment_date = bson::DateTime::from_chrono(date)
            }
            AppointmentChange::Days(days) => self.date_information.days = i64::from(days),
            AppointmentChange::MeetupLocation(point) => {
                self.location.meetup_location = GeoJsonPoint::from(&point)
            }
            AppointmentChange::DropoffLocation(point) => {
                self.location.dropoff_location = GeoJsonPoint::from(&point)
            }
        }
    }

    pub fn date_information(&self) -> Result<DateInformation, DomainError> {
        DateInformation::try_from(&self.date_information)
    }

    /// Pairs the stored fields with an already rebuilt rentee and listing.
    pub fn into_draft(self, rentee: Client, car_listing: CarListing) -> Result<AppointmentDraft, DomainError> {
        let date_information = self.date_information()?;
        Ok(AppointmentDraft {
            appointment_number: self.id,
            rentee: Some(rentee),
            car_listing: Some(car_listing),
            status: Some(self.status),
            date_information: Some(date_information),
            location: Some(AppointmentLocation::from(&self.location)),
            post_accept_information: Some(
                self.post_accept_information
                    .as_ref()
                    .map(PostAcceptInformation::from)
                    .unwrap_or_default(),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::appointment::{make_appointment, AppointmentUpdateFields};
    use chrono::{TimeZone, Utc};

    fn client() -> Client {
        Client {
            name: "Lola Perez".to_string(),
            email: "lolaperez@gmail.com".to_string(),
            date_of_birth: Utc.with_ymd_and_hms(1990, 2, 3, 0, 0, 0).unwrap(),
            is_verified: true,
            image: None,
            drivers_license: None,
            cell_number: "787-675-5439".to_string(),
        }
    }

    fn listing() -> CarListing {
        CarListing {
            license_plate: "ABC-123".to_string(),
            brand: "Toyota".to_string(),
            model: "Corolla".to_string(),
            year: 2019,
            price_per_day: 45.0,
        }
    }

    fn appointment() -> Appointment {
        Appointment {
            appointment_number: None,
            rentee: client(),
            car_listing: listing(),
            status: AppointmentStatus::Pending,
            date_information: DateInformation::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(), 2),
            location: AppointmentLocation {
                meetup_location: GeoPoint::new(18.2, -66.5, "X"),
                dropoff_location: GeoPoint::new(18.4, -66.1, "Airport"),
            },
            post_accept_information: None,
        }
    }

    fn stored() -> AppointmentDocument {
        let mut doc = AppointmentDocument::new(&appointment(), ObjectId::new(), ObjectId::new());
        doc.id = Some(ObjectId::new());
        doc
    }

    fn apply_all(doc: &mut AppointmentDocument, fields: AppointmentUpdateFields) {
        for change in fields.into_changes() {
            doc.apply(change);
        }
    }

    #[test]
    fn test_new_document_shape() {
        let raw = bson::to_document(&AppointmentDocument::new(&appointment(), ObjectId::new(), ObjectId::new())).unwrap();
        assert!(!raw.contains_key("_id"));
        assert!(!raw.contains_key("postAcceptInformation"));
        assert_eq!(raw.get_str("status").unwrap(), "Pending");
        let dates = raw.get_document("dateInformation").unwrap();
        assert!(dates.get_datetime("appointmentDate").is_ok());
        assert_eq!(dates.get_i64("days").unwrap(), 2);
        let meetup = raw.get_document("location").unwrap().get_document("meetupLocation").unwrap();
        assert_eq!(meetup.get_str("type").unwrap(), "Point");
    }

    #[test]
    fn test_days_only_update_keeps_start() {
        let mut doc = stored();
        let before = doc.date_information().unwrap();
        apply_all(&mut doc, AppointmentUpdateFields { days: Some(3), ..Default::default() });
        let after = doc.date_information().unwrap();
        assert_eq!(after.appointment_date, before.appointment_date);
        assert_eq!(after.days, 3);
        assert_eq!(after.end_date().unwrap(), Utc.with_ymd_and_hms(2024, 6, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_date_only_update_keeps_days() {
        let mut doc = stored();
        let new_start = Utc.with_ymd_and_hms(2024, 7, 10, 9, 0, 0).unwrap();
        apply_all(&mut doc, AppointmentUpdateFields { date: Some(new_start), ..Default::default() });
        let after = doc.date_information().unwrap();
        assert_eq!(after.appointment_date, new_start);
        assert_eq!(after.days, 2);
    }

    #[test]
    fn test_location_updates_are_independent() {
        let mut doc = stored();
        let dropoff_before = doc.location.dropoff_location.clone();
        apply_all(
            &mut doc,
            AppointmentUpdateFields {
                meetup_location: Some(GeoPoint::new(18.0, -67.0, "Mayaguez")),
                status: Some(AppointmentStatus::Accepted),
                ..Default::default()
            },
        );
        assert_eq!(doc.status, AppointmentStatus::Accepted);
        assert_eq!(doc.location.meetup_location.coordinates, [-67.0, 18.0]);
        assert_eq!(doc.location.meetup_location.address, "Mayaguez");
        assert_eq!(doc.location.dropoff_location, dropoff_before);
    }

    #[test]
    fn test_geo_point_round_trips_through_create_and_update() {
        let point = GeoPoint::new(18.2, -66.5, "X");

        let created = stored();
        assert_eq!(AppointmentLocation::from(&created.location).meetup_location, point);

        let mut updated = stored();
        apply_all(&mut updated, AppointmentUpdateFields { dropoff_location: Some(point.clone()), ..Default::default() });
        assert_eq!(AppointmentLocation::from(&updated.location).dropoff_location, point);
        assert_eq!(updated.location.dropoff_location, created.location.meetup_location);
    }

    #[test]
    fn test_reassembles_into_appointment() {
        let doc = stored();
        let id = doc.id;
        let raw = bson::to_document(&doc).unwrap();
        let read: AppointmentDocument = bson::from_document(raw).unwrap();
        let rebuilt = make_appointment(read.into_draft(client(), listing()).unwrap()).unwrap();
        assert_eq!(rebuilt.appointment_number, id);
        assert_eq!(rebuilt.location, appointment().location);
        assert_eq!(rebuilt.date_information, appointment().date_information);
        assert_eq!(rebuilt.post_accept_information, Some(PostAcceptInformation::default()));
    }

    #[test]
    fn test_negative_days_fail_reassembly() {
        let mut doc = stored();
        doc.date_information.days = -1;
        assert!(matches!(
            doc.into_draft(client(), listing()),
            Err(DomainError::InvalidField { field: "days", .. })
        ));
    }
}
