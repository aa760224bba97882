//! Catalog types as served by the upstream headless CMS.
//!
//! Field names follow the upstream JSON (camelCase). Unknown fields are
//! ignored so the CMS can grow its schema without breaking decoding, and
//! relations the CMS emits as `null` decode as empty lists.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::{CategoryId, ImageId, ProductId};

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Numeric identifier.
    pub id: ProductId,
    /// Stable document key, kept across drafts and republishing.
    #[serde(default)]
    pub document_id: String,
    pub title: String,
    /// Unit price in USD.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Long-form description.
    #[serde(default)]
    pub desc: String,
    /// Merchandising tag (`featured`, `trending`, or anything else).
    #[serde(rename = "type", default)]
    pub product_type: ProductType,
    #[serde(default)]
    pub is_new: Option<bool>,
    /// Front-view images, in display order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub img: Vec<Image>,
    /// Back-view images, in display order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub img2: Vec<Image>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether the product carries the "new" badge. A missing flag means no.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new.unwrap_or(false)
    }

    /// The image that represents this product in the cart: the first
    /// front-view image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&Image> {
        self.img.first()
    }

    /// Whether the product belongs to a category with the given title.
    #[must_use]
    pub fn in_category(&self, title: &str) -> bool {
        self.categories.iter().any(|c| c.title == title)
    }

    /// Whether `key` names this product, by numeric ID or by document key.
    #[must_use]
    pub fn matches_key(&self, key: &str) -> bool {
        self.id.to_string() == key || (!self.document_id.is_empty() && self.document_id == key)
    }
}

/// Merchandising tag used to build the home page sections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ProductType {
    Featured,
    Trending,
    /// Any other tag, preserved verbatim.
    Other(String),
    #[default]
    Untagged,
}

impl From<String> for ProductType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "featured" => Self::Featured,
            "trending" => Self::Trending,
            "" => Self::Untagged,
            _ => Self::Other(value),
        }
    }
}

impl From<Option<String>> for ProductType {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Untagged, Self::from)
    }
}

impl From<ProductType> for String {
    fn from(value: ProductType) -> Self {
        match value {
            ProductType::Featured => "featured".to_string(),
            ProductType::Trending => "trending".to_string(),
            ProductType::Other(tag) => tag,
            ProductType::Untagged => String::new(),
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Featured => f.write_str("featured"),
            Self::Trending => f.write_str("trending"),
            Self::Other(tag) => f.write_str(tag),
            Self::Untagged => Ok(()),
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category. Products and categories are many-to-many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub document_id: String,
    pub title: String,
}

// =============================================================================
// Image
// =============================================================================

/// An uploaded media file attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: ImageId,
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub name: String,
    /// Alt text for accessibility.
    #[serde(default)]
    pub alternative_text: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub mime: Option<String>,
    /// Upload path relative to the API origin, e.g. `/uploads/tee_1a2b.jpg`.
    pub url: String,
    /// Resized renditions generated by the CMS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formats: Option<ImageFormats>,
}

/// Resized renditions of an [`Image`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageFormats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<ImageFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<ImageFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<ImageFormat>,
}

/// One rendition of an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFormat {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Resolve an image's upload path against the API origin.
///
/// Returns an empty string when there is no image, matching how the
/// storefront renders a blank placeholder.
///
/// ```
/// use shopfront_core::{Image, ImageId, image_url};
///
/// let image = Image {
///     id: ImageId::new(1),
///     document_id: String::new(),
///     name: "tee.jpg".into(),
///     alternative_text: None,
///     width: None,
///     height: None,
///     mime: None,
///     url: "/uploads/tee.jpg".into(),
///     formats: None,
/// };
/// assert_eq!(image_url("http://localhost:5000/", Some(&image)), "http://localhost:5000/uploads/tee.jpg");
/// assert_eq!(image_url("http://localhost:5000", None), "");
/// ```
#[must_use]
pub fn image_url(base: &str, image: Option<&Image>) -> String {
    match image {
        Some(image) if !image.url.is_empty() => {
            if image.url.starts_with("http://") || image.url.starts_with("https://") {
                return image.url.clone();
            }
            let base = base.trim_end_matches('/');
            if image.url.starts_with('/') {
                format!("{base}{}", image.url)
            } else {
                format!("{base}/{}", image.url)
            }
        }
        _ => String::new(),
    }
}

// =============================================================================
// Listing envelope
// =============================================================================

/// Upstream listing envelope: `{data: Product[], meta: {pagination}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductList {
    pub data: Vec<Product>,
    #[serde(default)]
    pub meta: Meta,
}

/// Listing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Page position of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u32,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
