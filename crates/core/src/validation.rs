//! Form validation shared by the storefront and the back-office.
//!
//! Every check is a pure function. Field-level checks return a
//! [`ValidationError`]; the form-level `validate_*` functions collect them
//! into [`FieldErrors`] keyed by field name so a form can show every message
//! at once. Validation always runs before any remote call.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::types::{
    BuyerInfo, NewPremiumRequest, NewProduct, OrderItem, Phone, PhoneError, Price, ProductPatch,
};

/// Categories the shop sells. Product categories must be one of these.
pub const CATEGORIES: &[&str] = &[
    "T-shirts",
    "Hoodies",
    "Pantalons",
    "Vestes",
    "Casquettes",
    "Sneakers",
    "Accessoires",
];

/// Sizes a product may be offered in.
pub const SIZES: &[&str] = &[
    "XS", "S", "M", "L", "XL", "XXL", "XXXL", "36", "37", "38", "39", "40", "41", "42", "43",
    "44", "45", "46", "Unique",
];

/// Largest accepted price.
pub const MAX_PRICE: u64 = 10_000_000;

const NAME_LEN: (usize, usize) = (2, 100);
const ADDRESS_LEN: (usize, usize) = (5, 200);
const CITY_LEN: (usize, usize) = (2, 60);
const MAX_COLOR_LEN: usize = 30;

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}][\p{L}\p{N} '\-]*$").expect("Invalid regex"));

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@?[A-Za-z0-9._]{1,30}$").expect("Invalid regex"));

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },
    #[error("invalid phone number: {0}")]
    Phone(#[from] PhoneError),
    #[error("price must be between 1 and {max}")]
    PriceOutOfRange { max: u64 },
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("at least one {field} is required")]
    EmptyList { field: &'static str },
    #[error("unknown size: {0}")]
    UnknownSize(String),
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },
    #[error("invalid social handle: {0}")]
    InvalidHandle(String),
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// Validation failures keyed by form field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, serde::Serialize)]
#[error("{} invalid field(s)", .0.len())]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// Record the outcome of a field check.
    pub fn check<T>(&mut self, field: &'static str, result: Result<T, ValidationError>) {
        if let Err(err) = result {
            self.0.entry(field).or_insert_with(|| err.to_string());
        }
    }

    /// Message for a field, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(field, message)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    /// `Ok` when no field failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn check_length(
    field: &'static str,
    value: &str,
    (min, max): (usize, usize),
) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::Required { field });
    }
    if len < min || len > max {
        return Err(ValidationError::Length { field, min, max });
    }
    Ok(())
}

/// Validate and normalise a phone number.
///
/// # Errors
///
/// Returns `ValidationError::Phone` if the number does not parse.
pub fn validate_phone(raw: &str) -> Result<Phone, ValidationError> {
    Ok(Phone::parse(raw)?)
}

/// Validate a selling price.
///
/// # Errors
///
/// Returns `ValidationError::PriceOutOfRange` for zero or absurd prices.
pub const fn validate_price(price: Price) -> Result<(), ValidationError> {
    if price.amount() == 0 || price.amount() > MAX_PRICE {
        return Err(ValidationError::PriceOutOfRange { max: MAX_PRICE });
    }
    Ok(())
}

/// Validate a person or product name.
///
/// # Errors
///
/// Returns an error if the trimmed name is empty or outside 2-100 chars.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    check_length("name", name, NAME_LEN)
}

/// Validate a delivery address.
///
/// # Errors
///
/// Returns an error if the trimmed address is empty or outside 5-200 chars.
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    check_length("address", address, ADDRESS_LEN)
}

/// Validate a delivery city.
///
/// # Errors
///
/// Returns an error if the trimmed city is empty or outside 2-60 chars.
pub fn validate_city(city: &str) -> Result<(), ValidationError> {
    check_length("city", city, CITY_LEN)
}

/// Validate a category against the allow-list, returning its canonical name.
///
/// # Errors
///
/// Returns `ValidationError::UnknownCategory` if it is not in [`CATEGORIES`].
pub fn validate_category(category: &str) -> Result<&'static str, ValidationError> {
    let wanted = category.trim();
    if wanted.is_empty() {
        return Err(ValidationError::Required { field: "category" });
    }
    CATEGORIES
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| ValidationError::UnknownCategory(wanted.to_string()))
}

/// Validate the list of offered sizes.
///
/// # Errors
///
/// Returns an error if the list is empty, has duplicates, or holds an
/// unknown size.
pub fn validate_sizes(sizes: &[String]) -> Result<(), ValidationError> {
    if sizes.is_empty() {
        return Err(ValidationError::EmptyList { field: "size" });
    }
    for (i, size) in sizes.iter().enumerate() {
        if !SIZES.contains(&size.as_str()) {
            return Err(ValidationError::UnknownSize(size.clone()));
        }
        if sizes.iter().take(i).any(|earlier| earlier == size) {
            return Err(ValidationError::Duplicate {
                field: "size",
                value: size.clone(),
            });
        }
    }
    Ok(())
}

/// Validate the list of offered colors.
///
/// # Errors
///
/// Returns an error if the list is empty, has duplicates (case-insensitive),
/// or holds a malformed color name.
pub fn validate_colors(colors: &[String]) -> Result<(), ValidationError> {
    if colors.is_empty() {
        return Err(ValidationError::EmptyList { field: "color" });
    }
    for (i, color) in colors.iter().enumerate() {
        if color.chars().count() > MAX_COLOR_LEN || !COLOR_RE.is_match(color) {
            return Err(ValidationError::InvalidColor(color.clone()));
        }
        if colors
            .iter()
            .take(i)
            .any(|earlier| earlier.to_lowercase() == color.to_lowercase())
        {
            return Err(ValidationError::Duplicate {
                field: "color",
                value: color.clone(),
            });
        }
    }
    Ok(())
}

/// Validate an Instagram/TikTok handle.
///
/// # Errors
///
/// Returns `ValidationError::InvalidHandle` for malformed handles.
pub fn validate_handle(handle: &str) -> Result<(), ValidationError> {
    if HANDLE_RE.is_match(handle.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidHandle(handle.to_string()))
    }
}

/// Validate the admin product creation form.
///
/// # Errors
///
/// Returns every failing field.
pub fn validate_new_product(product: &NewProduct) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    errors.check("name", validate_name(&product.name));
    errors.check("category", validate_category(&product.category));
    errors.check("price", validate_price(product.price));
    errors.check("sizes", validate_sizes(&product.sizes));
    errors.check("colors", validate_colors(&product.colors));
    errors.into_result()
}

/// Validate the fields present in a sparse product update.
///
/// # Errors
///
/// Returns every failing field.
pub fn validate_product_patch(patch: &ProductPatch) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if let Some(name) = &patch.name {
        errors.check("name", validate_name(name));
    }
    if let Some(category) = &patch.category {
        errors.check("category", validate_category(category));
    }
    if let Some(price) = patch.price {
        errors.check("price", validate_price(price));
    }
    if let Some(sizes) = &patch.sizes {
        errors.check("sizes", validate_sizes(sizes));
    }
    if let Some(colors) = &patch.colors {
        errors.check("colors", validate_colors(colors));
    }
    errors.into_result()
}

/// Validate the checkout form before any payment is attempted.
///
/// # Errors
///
/// Returns every failing field.
pub fn validate_checkout(
    buyer: &BuyerInfo,
    city: &str,
    items: &[OrderItem],
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    errors.check("name", validate_name(&buyer.name));
    errors.check("phone", validate_phone(&buyer.phone));
    errors.check("address", validate_address(&buyer.address));
    errors.check("city", validate_city(city));
    if items.is_empty() {
        errors.check::<()>("items", Err(ValidationError::EmptyList { field: "item" }));
    } else if items.iter().any(|item| item.quantity == 0) {
        errors.check::<()>("items", Err(ValidationError::InvalidQuantity));
    }
    errors.into_result()
}

/// Validate the public premium request form.
///
/// # Errors
///
/// Returns every failing field.
pub fn validate_premium_request(request: &NewPremiumRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    errors.check("full_name", validate_name(&request.full_name));
    errors.check("phone", validate_phone(&request.phone));
    if let Some(handle) = &request.instagram {
        errors.check("instagram", validate_handle(handle));
    }
    if let Some(handle) = &request.tiktok {
        errors.check("tiktok", validate_handle(handle));
    }
    errors.into_result()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn new_product() -> NewProduct {
        NewProduct {
            name: "Hoodie Dakar".to_string(),
            category: "Hoodies".to_string(),
            price: Price::new(15_000),
            original_price: None,
            stock: 12,
            sizes: strings(&["M", "L"]),
            colors: strings(&["Noir", "Blanc cassé"]),
            image_url: None,
            is_new: true,
            is_active: true,
            description: None,
        }
    }

    #[test]
    fn test_price_bounds() {
        assert!(validate_price(Price::new(1)).is_ok());
        assert!(validate_price(Price::new(MAX_PRICE)).is_ok());
        assert!(validate_price(Price::ZERO).is_err());
        assert!(validate_price(Price::new(MAX_PRICE + 1)).is_err());
    }

    #[test]
    fn test_name_length() {
        assert!(validate_name("Al").is_ok());
        assert_eq!(
            validate_name("   "),
            Err(ValidationError::Required { field: "name" })
        );
        assert!(matches!(
            validate_name("A"),
            Err(ValidationError::Length { .. })
        ));
        assert!(validate_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_address() {
        assert!(validate_address("Sacré-Coeur 3, Villa 12").is_ok());
        assert!(validate_address("abc").is_err());
    }

    #[test]
    fn test_category_allow_list() {
        assert_eq!(validate_category("hoodies").unwrap(), "Hoodies");
        assert!(matches!(
            validate_category("Robes"),
            Err(ValidationError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_sizes() {
        assert!(validate_sizes(&strings(&["S", "M", "42"])).is_ok());
        assert!(validate_sizes(&[]).is_err());
        assert!(matches!(
            validate_sizes(&strings(&["M", "XM"])),
            Err(ValidationError::UnknownSize(_))
        ));
        assert!(matches!(
            validate_sizes(&strings(&["M", "M"])),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_colors() {
        assert!(validate_colors(&strings(&["Noir", "Bleu nuit", "Rose-pâle"])).is_ok());
        assert!(validate_colors(&[]).is_err());
        assert!(validate_colors(&strings(&["#000"])).is_err());
        assert!(matches!(
            validate_colors(&strings(&["Noir", "noir"])),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_handles() {
        assert!(validate_handle("@kaay.streetwear").is_ok());
        assert!(validate_handle("kaay_sn").is_ok());
        assert!(validate_handle("bad handle").is_err());
    }

    #[test]
    fn test_new_product_collects_all_errors() {
        let mut product = new_product();
        assert!(validate_new_product(&product).is_ok());

        product.name = String::new();
        product.price = Price::ZERO;
        product.sizes.clear();
        let errors = validate_new_product(&product).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("name"), Some("name is required"));
        assert!(errors.get("price").is_some());
        assert!(errors.get("sizes").is_some());
        assert!(errors.get("colors").is_none());
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        assert!(validate_product_patch(&ProductPatch::default()).is_ok());
        let patch = ProductPatch {
            category: Some("Robes".to_string()),
            ..ProductPatch::default()
        };
        let errors = validate_product_patch(&patch).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("category").is_some());
    }

    #[test]
    fn test_original_price_below_price_is_accepted() {
        let mut product = new_product();
        product.original_price = Some(Price::new(1000));
        assert!(validate_new_product(&product).is_ok());
    }

    #[test]
    fn test_checkout() {
        let buyer = BuyerInfo {
            name: "Awa Diop".to_string(),
            phone: "77 123 45 67".to_string(),
            address: "Rue 10, Medina".to_string(),
        };
        let items = vec![OrderItem {
            product_id: ProductId::new("p1"),
            name: "Tee".to_string(),
            price: Price::new(5000),
            quantity: 1,
            size: "M".to_string(),
            color: "Noir".to_string(),
        }];
        assert!(validate_checkout(&buyer, "Dakar", &items).is_ok());

        let errors = validate_checkout(&buyer, "", &[]).unwrap_err();
        assert!(errors.get("city").is_some());
        assert!(errors.get("items").is_some());
    }

    #[test]
    fn test_field_errors_serialize_as_map() {
        let mut errors = FieldErrors::default();
        errors.check::<()>("phone", Err(ValidationError::Phone(PhoneError::Empty)));
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["phone"], "invalid phone number: phone number cannot be empty");
    }
}
