use serde::{Deserialize, Serialize};

use super::repo_types::ListingFields;
use crate::error::AppError;

/// Body of create and update requests. Unknown fields such as an owner id
/// are ignored; the owner always comes from the bearer token.
#[derive(Debug, Default, Deserialize)]
pub struct ListingRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    /// Only honoured on update.
    #[serde(default)]
    pub sold: Option<bool>,
}

impl ListingRequest {
    pub fn validate(self) -> Result<(ListingFields, Option<bool>), AppError> {
        let title = required_text(self.title, "title")?;
        let author = required_text(self.author, "author")?;
        let price = match self.price {
            Some(p) if p.is_finite() && p >= 0.0 => p,
            Some(_) => {
                return Err(AppError::Validation(
                    "price must be a non-negative number".into(),
                ))
            }
            None => return Err(AppError::Validation("price is required".into())),
        };
        let fields = ListingFields {
            title,
            author,
            description: self.description.unwrap_or_default(),
            price,
        };
        Ok((fields, self.sold))
    }
}

fn required_text(value: Option<String>, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{name} is required"))),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
