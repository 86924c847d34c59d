use bson::oid::ObjectId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::car_listing::CarListing;
use crate::model::client::Client;
use crate::model::domain_error::{require, DomainError};
use crate::model::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Accepted => "Accepted",
            AppointmentStatus::Rejected => "Rejected",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    /// Only accepted appointments occupy the car.
    pub fn blocks_schedule(&self) -> bool {
        matches!(self, AppointmentStatus::Accepted)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The rented period: `[appointment_date, appointment_date + days * 24h)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateInformation {
    pub appointment_date: DateTime<Utc>,
    pub days: u32,
}

impl DateInformation {
    pub fn new(appointment_date: DateTime<Utc>, days: u32) -> Self {
        DateInformation {
            appointment_date,
            days,
        }
    }

    /// Fails when the end falls past the last representable date.
    pub fn end_date(&self) -> Result<DateTime<Utc>, DomainError> {
        self.appointment_date
            .checked_add_signed(Duration::days(i64::from(self.days)))
            .ok_or_else(|| {
                DomainError::invalid_field(
                    "days",
                    format!("{} days from {} is out of range", self.days, self.appointment_date),
                )
            })
    }

    /// Half-open interval intersection. Adjacent ranges do not overlap and a
    /// zero-day range overlaps nothing. An end past the last representable
    /// date counts as open-ended.
    pub fn overlaps(&self, other: &DateInformation) -> bool {
        let end = |range: &DateInformation| range.end_date().unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.appointment_date < end(other) && other.appointment_date < end(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentLocation {
    #[validate(nested)]
    pub meetup_location: GeoPoint,
    #[validate(nested)]
    pub dropoff_location: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAcceptInformation {
    pub date_accepted: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Assigned once, when the appointment is first persisted.
    pub appointment_number: Option<ObjectId>,
    pub rentee: Client,
    pub car_listing: CarListing,
    pub status: AppointmentStatus,
    pub date_information: DateInformation,
    pub location: AppointmentLocation,
    pub post_accept_information: Option<PostAcceptInformation>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct AppointmentDraft {
    pub appointment_number: Option<ObjectId>,
    #[validate(required)]
    pub rentee: Option<Client>,
    #[validate(required)]
    pub car_listing: Option<CarListing>,
    #[validate(required)]
    pub status: Option<AppointmentStatus>,
    #[validate(required)]
    pub date_information: Option<DateInformation>,
    #[validate(required)]
    pub location: Option<AppointmentLocation>,
    pub post_accept_information: Option<PostAcceptInformation>,
}

pub fn make_appointment(draft: AppointmentDraft) -> Result<Appointment, DomainError> {
    draft.validate()?;
    let location = require(draft.location, "location")?;
    location.validate()?;
    Ok(Appointment {
        appointment_number: draft.appointment_number,
        rentee: require(draft.rentee, "rentee")?,
        car_listing: require(draft.car_listing, "carListing")?,
        status: require(draft.status, "status")?,
        date_information: require(draft.date_information, "dateInformation")?,
        location,
        post_accept_information: draft.post_accept_information,
    })
}

/// Sparse update request. Each member is applied on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentUpdateFields {
    pub status: Option<AppointmentStatus>,
    pub date: Option<DateTime<Utc>>,
    pub days: Option<u32>,
    pub meetup_location: Option<GeoPoint>,
    pub dropoff_location: Option<GeoPoint>,
}

/// One field-level change carried by [`AppointmentUpdateFields`].
#[derive(Debug, Clone, PartialEq)]
pub enum AppointmentChange {
    Status(AppointmentStatus),
    Date(DateTime<Utc>),
    Days(u32),
    MeetupLocation(GeoPoint),
    DropoffLocation(GeoPoint),
}

impl AppointmentUpdateFields {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.date.is_none()
            && self.days.is_none()
            && self.meetup_location.is_none()
            && self.dropoff_location.is_none()
    }

    pub fn validate_locations(&self) -> Result<(), DomainError> {
        for point in [&self.meetup_location, &self.dropoff_location].into_iter().flatten() {
            point.validate()?;
        }
        Ok(())
    }

    pub fn into_changes(self) -> Vec<AppointmentChange> {
        let mut changes = Vec::new();
        if let Some(status) = self.status {
            changes.push(AppointmentChange::Status(status));
        }
        if let Some(date) = self.date {
            changes.push(AppointmentChange::Date(date));
        }
        if let Some(days) = self.days {
            changes.push(AppointmentChange::Days(days));
        }
        if let Some(point) = self.meetup_location {
            changes.push(AppointmentChange::MeetupLocation(point));
        }
        if let Some(point) = self.dropoff_location {
            changes.push(AppointmentChange::DropoffLocation(point));
        }
        changes
    }

    /// The period the appointment will have once these fields are applied.
    pub fn merged_dates(&self, current: &DateInformation) -> DateInformation {
        DateInformation {
            appointment_date: self.date.unwrap_or(current.appointment_date),
            days: self.days.unwrap_or(current.days),
        }
    }
}
