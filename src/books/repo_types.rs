use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A book offered for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub price: f64,
    pub sold: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated, caller-editable part of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFields {
    pub title: String,
    pub author: String,
    pub description: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seller {
    pub email: String,
}

/// Listing as shown publicly: the seller is reduced to their email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingWithSeller {
    #[serde(flatten)]
    pub listing: Listing,
    pub seller: Seller,
}

#[derive(Debug, FromRow)]
pub struct ListingSellerRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub price: f64,
    pub sold: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub seller_email: String,
}

impl From<ListingSellerRow> for ListingWithSeller {
    fn from(r: ListingSellerRow) -> Self {
        Self {
            listing: Listing {
                id: r.id,
                owner_id: r.owner_id,
                title: r.title,
                author: r.author,
                description: r.description,
                price: r.price,
                sold: r.sold,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
            seller: Seller {
                email: r.seller_email,
            },
        }
    }
}
