//! Raw Appwrite documents and their conversion into validated records.
//!
//! Documents are deserialized leniently (every attribute optional) and then
//! checked here, so a malformed document surfaces as
//! [`BackendError::InvalidPayload`] naming the document and attribute instead
//! of an opaque JSON error.

use food_order_core::{
    AccountId, CategoryId, CustomizationId, Email, MenuItemId, Price, UserId,
};
use serde::Deserialize;

use crate::backend::BackendError;
use crate::backend::types::{Category, Customization, CustomizationKind, MenuItem, User};

/// A page of documents.
#[derive(Debug, Deserialize)]
pub struct DocumentList<T> {
    #[serde(default)]
    pub total: u64,
    pub documents: Vec<T>,
}

/// A relationship attribute: either a bare id or an expanded document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Relation {
    Id(String),
    Document {
        #[serde(rename = "$id")]
        id: String,
    },
}

impl Relation {
    pub fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Document { id } => id,
        }
    }
}

/// A relationship that may be one-to-one or one-to-many.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Relations {
    One(Relation),
    Many(Vec<Relation>),
}

impl Relations {
    pub fn into_ids(self) -> Vec<String> {
        match self {
            Self::One(r) => vec![r.into_id()],
            Self::Many(rs) => rs.into_iter().map(Relation::into_id).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MenuDocument {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub protein: Option<u32>,
    #[serde(default)]
    pub categories: Option<Relation>,
    #[serde(default, rename = "menuCustomization")]
    pub menu_customization: Option<Relations>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryDocument {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomizationDocument {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Join document linking a menu item to one customization.
#[derive(Debug, Deserialize)]
pub struct MenuCustomizationDocument {
    #[serde(default)]
    pub customizations: Option<Relations>,
}

#[derive(Debug, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "accountId")]
    pub account_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// `GET /account` and `POST /account` response.
#[derive(Debug, Deserialize)]
pub struct AccountResponse {
    #[serde(rename = "$id")]
    pub id: String,
}

/// `POST /storage/buckets/{bucket}/files` response.
#[derive(Debug, Deserialize)]
pub struct FileResponse {
    #[serde(rename = "$id")]
    pub id: String,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

// =============================================================================
// Validation
// =============================================================================

fn invalid(collection: &str, id: &str, reason: impl std::fmt::Display) -> BackendError {
    BackendError::InvalidPayload(format!("{collection} document {id:?}: {reason}"))
}

fn required(
    value: Option<String>,
    collection: &str,
    id: &str,
    attribute: &str,
) -> Result<String, BackendError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(invalid(collection, id, format_args!("missing {attribute}"))),
    }
}

fn price(value: Option<f64>, collection: &str, id: &str) -> Result<Price, BackendError> {
    let value = value.ok_or_else(|| invalid(collection, id, "missing price"))?;
    Price::from_f64(value).map_err(|e| invalid(collection, id, e))
}

fn document_id(id: &str, collection: &str) -> Result<(), BackendError> {
    if id.is_empty() {
        return Err(invalid(collection, id, "empty $id"));
    }
    Ok(())
}

impl TryFrom<MenuDocument> for MenuItem {
    type Error = BackendError;

    fn try_from(doc: MenuDocument) -> Result<Self, Self::Error> {
        const COLLECTION: &str = "menu";
        document_id(&doc.id, COLLECTION)?;

        let rating = doc.rating.unwrap_or_default();
        if !rating.is_finite() || rating < 0.0 {
            return Err(invalid(COLLECTION, &doc.id, "rating must be a non-negative number"));
        }

        Ok(Self {
            name: required(doc.name, COLLECTION, &doc.id, "name")?,
            image_url: required(doc.image_url, COLLECTION, &doc.id, "image_url")?,
            price: price(doc.price, COLLECTION, &doc.id)?,
            description: doc.description.unwrap_or_default(),
            rating,
            calories: doc.calories.unwrap_or_default(),
            protein: doc.protein.unwrap_or_default(),
            category_id: doc
                .categories
                .map(Relation::into_id)
                .filter(|id| !id.is_empty())
                .map(CategoryId::new),
            customization_ids: doc
                .menu_customization
                .map(Relations::into_ids)
                .unwrap_or_default()
                .into_iter()
                .filter(|id| !id.is_empty())
                .map(CustomizationId::new)
                .collect(),
            id: MenuItemId::new(doc.id),
        })
    }
}

impl TryFrom<CategoryDocument> for Category {
    type Error = BackendError;

    fn try_from(doc: CategoryDocument) -> Result<Self, Self::Error> {
        const COLLECTION: &str = "categories";
        document_id(&doc.id, COLLECTION)?;
        Ok(Self {
            name: required(doc.name, COLLECTION, &doc.id, "name")?,
            description: doc.description.unwrap_or_default(),
            id: CategoryId::new(doc.id),
        })
    }
}

impl TryFrom<CustomizationDocument> for Customization {
    type Error = BackendError;

    fn try_from(doc: CustomizationDocument) -> Result<Self, Self::Error> {
        const COLLECTION: &str = "customization";
        document_id(&doc.id, COLLECTION)?;
        Ok(Self {
            name: required(doc.name, COLLECTION, &doc.id, "name")?,
            price: price(doc.price, COLLECTION, &doc.id)?,
            kind: CustomizationKind::from(doc.kind.unwrap_or_else(|| "other".to_owned())),
            id: CustomizationId::new(doc.id),
        })
    }
}

impl TryFrom<UserDocument> for User {
    type Error = BackendError;

    fn try_from(doc: UserDocument) -> Result<Self, Self::Error> {
        const COLLECTION: &str = "user";
        document_id(&doc.id, COLLECTION)?;
        let email = required(doc.email, COLLECTION, &doc.id, "email")?;
        Ok(Self {
            account_id: AccountId::new(required(doc.account_id, COLLECTION, &doc.id, "accountId")?),
            name: required(doc.name, COLLECTION, &doc.id, "name")?,
            email: Email::parse(&email).map_err(|e| invalid(COLLECTION, &doc.id, e))?,
            avatar_url: doc.avatar.unwrap_or_default(),
            id: UserId::new(doc.id),
        })
    }
}

/// Convert every document, failing on the first invalid one.
pub fn convert_all<D, T>(documents: Vec<D>) -> Result<Vec<T>, BackendError>
where
    T: TryFrom<D, Error = BackendError>,
{
    documents.into_iter().map(T::try_from).collect()
}
