use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};

use crate::config::booking_conf::BookingConfig;
use crate::model::appointment::{Appointment, AppointmentStatus, AppointmentUpdateFields, DateInformation};
use crate::repository::appointment_repo::{AppointmentRepository, BookingOutcome, UpdateOutcome};
use crate::util::error::ServiceError;

#[async_trait]
pub trait AppointmentService: Send + Sync {
    async fn request_appointment(&self, appointment: Appointment) -> Result<Appointment, ServiceError>;
    async fn check_availability(&self, date: DateTime<Utc>, days: u32, license_plate: &str) -> Result<bool, ServiceError>;
    async fn update_appointment(&self, id: ObjectId, fields: AppointmentUpdateFields) -> Result<Appointment, ServiceError>;
    async fn get_appointment(&self, id: ObjectId) -> Result<Appointment, ServiceError>;
}

pub struct AppointmentServiceImpl {
    pub appointment_repo: Arc<dyn AppointmentRepository>,
    pub booking: BookingConfig,
}

impl AppointmentServiceImpl {
    pub fn new(appointment_repo: Arc<dyn AppointmentRepository>, booking: BookingConfig) -> Self {
        Self { appointment_repo, booking }
    }

    fn check_days(&self, days: u32) -> Result<(), ServiceError> {
        if self.booking.allows(days) {
            return Ok(());
        }
        warn!(days, min = self.booking.min_days, max = self.booking.max_days, "Rental length out of bounds");
        Err(ServiceError::InvalidInput(format!(
            "Rental must last between {} and {} days, got {}",
            self.booking.min_days, self.booking.max_days, days
        )))
    }

    async fn ensure_free(&self, id: &ObjectId, license_plate: &str, period: &DateInformation) -> Result<(), ServiceError> {
        let overlapping = self
            .appointment_repo
            .overlap_exists_excluding(period.appointment_date, period.days, license_plate, id)
            .await?;
        if overlapping {
            warn!("Update would overlap another accepted appointment");
            return Err(ServiceError::Conflict(
                "Another accepted appointment already occupies this period".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AppointmentService for AppointmentServiceImpl {
    #[instrument(skip(self, appointment), fields(email = %appointment.rentee.email, license_plate = %appointment.car_listing.license_plate))]
    async fn request_appointment(&self, appointment: Appointment) -> Result<Appointment, ServiceError> {
        info!("Requesting appointment");
        self.check_days(appointment.date_information.days)?;

        let outcome = self.appointment_repo.book_appointment(appointment).await;
        if let Err(e) = &outcome {
            error!("Failed to book appointment: {e}");
        }
        match outcome? {
            BookingOutcome::Booked(booked) => {
                info!(appointment_number = ?booked.appointment_number, "Appointment requested successfully");
                Ok(booked)
            }
            BookingOutcome::Unresolved => Err(ServiceError::NotFound(
                "Rentee or car listing not found".to_string(),
            )),
            BookingOutcome::Overlap => Err(ServiceError::Conflict(
                "The car is already booked for part of this period".to_string(),
            )),
        }
    }

    #[instrument(skip(self), fields(date = %date))]
    async fn check_availability(&self, date: DateTime<Utc>, days: u32, license_plate: &str) -> Result<bool, ServiceError> {
        self.check_days(days)?;
        let overlapping = self.appointment_repo.overlap_exists(date, days, license_plate).await;
        match &overlapping {
            Ok(found) => info!(available = !found, "Availability checked"),
            Err(e) => error!("Failed to check availability: {e}"),
        }
        Ok(!overlapping?)
    }

    #[instrument(skip(self, fields), fields(id = %id, changes = ?fields))]
    async fn update_appointment(&self, id: ObjectId, fields: AppointmentUpdateFields) -> Result<Appointment, ServiceError> {
        info!("Updating appointment");
        if fields.is_empty() {
            return Err(ServiceError::InvalidInput("No fields to update".to_string()));
        }
        fields.validate_locations()?;
        if let Some(days) = fields.days {
            self.check_days(days)?;
        }

        // an accepted appointment locks the car, so its final period must be free
        let moves_period = fields.date.is_some() || fields.days.is_some();
        if fields.status == Some(AppointmentStatus::Accepted) || (fields.status.is_none() && moves_period) {
            let current = self.get_appointment(id).await?;
            let status = fields.status.unwrap_or(current.status);
            let period = fields.merged_dates(&current.date_information);
            let newly_accepted = current.status != AppointmentStatus::Accepted;
            if status.blocks_schedule() && (newly_accepted || period != current.date_information) {
                self.ensure_free(&id, &current.car_listing.license_plate, &period).await?;
            }
        }

        match self.appointment_repo.update_appointment(&id, fields).await? {
            UpdateOutcome::Updated(appointment) => {
                info!("Appointment updated successfully");
                Ok(appointment)
            }
            UpdateOutcome::NotFound => Err(ServiceError::NotFound(format!("Appointment not found: {}", id))),
            UpdateOutcome::ReassemblyFailed { appointment_number, reason } => {
                error!(%appointment_number, %reason, "Update stored but response could not be rebuilt");
                Err(ServiceError::InternalError(format!(
                    "Appointment {} was updated but could not be loaded: {}",
                    appointment_number, reason
                )))
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_appointment(&self, id: ObjectId) -> Result<Appointment, ServiceError> {
        let res = self.appointment_repo.find_by_appointment_number(&id).await;
        match &res {
            Ok(Some(_)) => info!("Appointment fetched successfully"),
            Ok(None) => warn!("Appointment not found"),
            Err(e) => error!("Failed to fetch appointment: {e}"),
        }
        res?.ok_or_else(|| ServiceError::NotFound(format!("Appointment not found: {}", id)))
    }
}
