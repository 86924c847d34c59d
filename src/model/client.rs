use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::domain_error::{require, DomainError};

/// A renter, as the booking domain uses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub name: String,
    pub email: String,
    pub date_of_birth: DateTime<Utc>,
    pub is_verified: bool,
    pub image: Option<String>,
    pub drivers_license: Option<String>,
    pub cell_number: String,
}

/// Unchecked client input. Every member may be missing; `make_client` decides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientDraft {
    #[validate(required, length(min = 1))]
    pub name: Option<String>,
    #[validate(required, email)]
    pub email: Option<String>,
    #[validate(required)]
    pub date_of_birth: Option<DateTime<Utc>>,
    pub is_verified: Option<bool>,
    pub image: Option<String>,
    pub drivers_license: Option<String>,
    #[validate(required, length(min = 1))]
    pub cell_number: Option<String>,
}

pub fn make_client(draft: ClientDraft) -> Result<Client, DomainError> {
    draft.validate()?;
    Ok(Client {
        name: require(draft.name, "name")?,
        email: require(draft.email, "email")?,
        date_of_birth: require(draft.date_of_birth, "dateOfBirth")?,
        is_verified: draft.is_verified.unwrap_or(false),
        image: draft.image,
        drivers_license: draft.drivers_license,
        cell_number: require(draft.cell_number, "cellNumber")?,
    })
}

/// Stored shape of a client. Fields the domain requires may still be absent
/// here; `make_client` enforces the rules on the way out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: Option<String>,
    pub email: String,
    pub date_of_birth: Option<bson::DateTime>,
    #[serde(default)]
    pub is_verified: bool,
    pub image: Option<String>,
    pub drivers_license: Option<String>,
    pub cell_number: Option<String>,
}

impl From<&Client> for ClientDocument {
    fn from(client: &Client) -> Self {
        ClientDocument {
            id: None,
            name: Some(client.name.clone()),
            email: client.email.clone(),
            date_of_birth: Some(bson::DateTime::from_chrono(client.date_of_birth)),
            is_verified: client.is_verified,
            image: client.image.clone(),
            drivers_license: client.drivers_license.clone(),
            cell_number: Some(client.cell_number.clone()),
        }
    }
}

impl From<ClientDocument> for ClientDraft {
    fn from(doc: ClientDocument) -> Self {
        ClientDraft {
            name: doc.name,
            email: Some(doc.email),
            date_of_birth: doc.date_of_birth.map(|d| d.to_chrono()),
            is_verified: Some(doc.is_verified),
            image: doc.image,
            drivers_license: doc.drivers_license,
            cell_number: doc.cell_number,
        }
    }
}
