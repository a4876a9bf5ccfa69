//! Advertising offers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const HEADLINE_MIN: usize = 5;
const HEADLINE_MAX: usize = 150;
const BODY_MIN: usize = 10;
const BODY_MAX: usize = 500;

/// An advertising offer shown to the panel.
///
/// Immutable for the lifetime of a batch; build through [`Offer::builder`]
/// which enforces the length bounds, or deserialize and call
/// [`validate`](Offer::validate) before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    /// Main headline, 5-150 characters.
    pub headline: String,
    /// Offer copy, 10-500 characters.
    pub body: String,
    /// Call to action (e.g. "Book now").
    pub call_to_action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    /// Description of the creative, for simulation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,

    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(default = "default_category")]
    pub product_category: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_category() -> String {
    "laser_hair_removal".to_string()
}

impl Offer {
    pub fn builder(
        headline: impl Into<String>,
        body: impl Into<String>,
        call_to_action: impl Into<String>,
    ) -> OfferBuilder {
        OfferBuilder {
            offer: Offer {
                headline: headline.into(),
                body: body.into(),
                call_to_action: call_to_action.into(),
                price: None,
                discount: None,
                image_description: None,
                target_audience: None,
                test_id: None,
                product_category: default_category(),
                created_at: Utc::now(),
            },
        }
    }

    /// Check the length bounds. Character counts, not bytes.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let headline_len = self.headline.chars().count();
        if !(HEADLINE_MIN..=HEADLINE_MAX).contains(&headline_len) {
            return Err(ValidationError::BadLength {
                field: "headline",
                min: HEADLINE_MIN,
                max: HEADLINE_MAX,
                len: headline_len,
            });
        }
        let body_len = self.body.chars().count();
        if !(BODY_MIN..=BODY_MAX).contains(&body_len) {
            return Err(ValidationError::BadLength {
                field: "body",
                min: BODY_MIN,
                max: BODY_MAX,
                len: body_len,
            });
        }
        if self.call_to_action.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "call_to_action",
            });
        }
        Ok(())
    }

    /// Render the offer the way a persona sees it.
    pub fn to_display_text(&self) -> String {
        let mut parts = vec![format!("**{}**", self.headline), format!("\n{}", self.body)];

        if let Some(ref price) = self.price {
            parts.push(format!("\nPrice: {price}"));
        }
        if let Some(ref discount) = self.discount {
            parts.push(format!("\nDiscount: {discount}"));
        }
        if let Some(ref image) = self.image_description {
            parts.push(format!("\nVisual: {image}"));
        }

        parts.push(format!("\n\n[{}]", self.call_to_action));
        parts.join("\n")
    }
}

/// Builder for [`Offer`]; `build` runs validation.
#[derive(Debug)]
pub struct OfferBuilder {
    offer: Offer,
}

impl OfferBuilder {
    pub fn price(mut self, price: impl Into<String>) -> Self {
        self.offer.price = Some(price.into());
        self
    }

    pub fn discount(mut self, discount: impl Into<String>) -> Self {
        self.offer.discount = Some(discount.into());
        self
    }

    pub fn image_description(mut self, description: impl Into<String>) -> Self {
        self.offer.image_description = Some(description.into());
        self
    }

    pub fn target_audience(mut self, audience: impl Into<String>) -> Self {
        self.offer.target_audience = Some(audience.into());
        self
    }

    pub fn test_id(mut self, id: impl Into<String>) -> Self {
        self.offer.test_id = Some(id.into());
        self
    }

    pub fn product_category(mut self, category: impl Into<String>) -> Self {
        self.offer.product_category = category.into();
        self
    }

    pub fn build(self) -> Result<Offer, ValidationError> {
        self.offer.validate()?;
        Ok(self.offer)
    }
}
