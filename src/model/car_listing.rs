use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::domain_error::{require, DomainError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarListing {
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price_per_day: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CarListingDraft {
    #[validate(required, length(min = 1))]
    pub license_plate: Option<String>,
    #[validate(required, length(min = 1))]
    pub brand: Option<String>,
    #[validate(required, length(min = 1))]
    pub model: Option<String>,
    #[validate(required, range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    #[validate(required, range(min = 0.0))]
    pub price_per_day: Option<f64>,
}

pub fn make_car_listing(draft: CarListingDraft) -> Result<CarListing, DomainError> {
    draft.validate()?;
    Ok(CarListing {
        license_plate: require(draft.license_plate, "licensePlate")?,
        brand: require(draft.brand, "brand")?,
        model: require(draft.model, "model")?,
        year: require(draft.year, "year")?,
        price_per_day: require(draft.price_per_day, "pricePerDay")?,
    })
}

/// Stored shape of a listing.
///
/// `booking_version` is bumped by every transactional booking on the listing
/// so that concurrent bookings for the same car conflict on this document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarListingDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub license_plate: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price_per_day: Option<f64>,
    #[serde(default)]
    pub booking_version: i64,
}

impl From<&CarListing> for CarListingDocument {
    fn from(listing: &CarListing) -> Self {
        CarListingDocument {
            id: None,
            license_plate: listing.license_plate.clone(),
            brand: Some(listing.brand.clone()),
            model: Some(listing.model.clone()),
            year: Some(listing.year),
            price_per_day: Some(listing.price_per_day),
            booking_version: 0,
        }
    }
}

impl From<CarListingDocument> for CarListingDraft {
    fn from(doc: CarListingDocument) -> Self {
        CarListingDraft {
            license_plate: Some(doc.license_plate),
            brand: doc.brand,
            model: doc.model,
            year: doc.year,
            price_per_day: doc.price_per_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> CarListingDraft {
        CarListingDraft {
            license_plate: Some("ABC-123".to_string()),
            brand: Some("Toyota".to_string()),
            model: Some("Corolla".to_string()),
            year: Some(2019),
            price_per_day: Some(45.0),
        }
    }

    #[test]
    fn test_make_car_listing() {
        let listing = make_car_listing(draft()).unwrap();
        assert_eq!(listing.license_plate, "ABC-123");
        assert_eq!(listing.year, 2019);
    }

    #[test]
    fn test_make_car_listing_requires_plate() {
        let mut d = draft();
        d.license_plate = None;
        assert!(matches!(make_car_listing(d), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_make_car_listing_rejects_out_of_range_values() {
        let mut d = draft();
        d.year = Some(1800);
        assert!(make_car_listing(d).is_err());

        let mut d = draft();
        d.price_per_day = Some(-1.0);
        assert!(make_car_listing(d).is_err());
    }

    #[test]
    fn test_document_defaults_booking_version() {
        let raw = bson::doc! { "licensePlate": "XYZ-999", "brand": "Kia" };
        let doc: CarListingDocument = bson::from_document(raw).unwrap();
        assert_eq!(doc.booking_version, 0);
        assert!(doc.id.is_none());
        // a listing stored without a model can be read but not reassembled
        assert!(make_car_listing(CarListingDraft::from(doc)).is_err());
    }
}
