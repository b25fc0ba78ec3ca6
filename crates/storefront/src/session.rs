//! Per-shopper state: cart, favorites and saved buyer profile.
//!
//! A `ShopperSession` is opened from the local store for one shopper id and
//! owns that shopper's stores for the duration of a request. `close` drops the
//! in-memory state; `forget` also deletes everything persisted for the
//! shopper.

use std::sync::Arc;

use kaay_core::validation::{
    FieldErrors, validate_address, validate_city, validate_name, validate_phone,
};
use kaay_core::{BuyerInfo, ShopperId};
use kaay_data::local::{forget_shopper, load_json, save_json};
use kaay_data::{LocalStore, keys};
use serde::{Deserialize, Serialize};

use crate::store::{CartStore, FavoritesStore};

/// Buyer details remembered between checkouts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

impl Profile {
    /// Check every field, normalising the phone number.
    ///
    /// # Errors
    ///
    /// Returns the failed fields.
    pub fn validated(mut self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check("name", validate_name(&self.name));
        errors.check("address", validate_address(&self.address));
        errors.check("city", validate_city(&self.city));
        match validate_phone(&self.phone) {
            Ok(phone) => self.phone = phone.as_str().to_string(),
            Err(e) => errors.check::<()>("phone", Err(e)),
        }
        if errors.is_empty() {
            self.name = self.name.trim().to_string();
            self.address = self.address.trim().to_string();
            self.city = self.city.trim().to_string();
            Ok(self)
        } else {
            Err(errors)
        }
    }

    /// Buyer snapshot for an order.
    #[must_use]
    pub fn buyer(&self) -> BuyerInfo {
        BuyerInfo {
            name: self.name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
        }
    }
}

/// One shopper's state.
pub struct ShopperSession {
    shopper: ShopperId,
    pub cart: CartStore,
    pub favorites: FavoritesStore,
    profile: Option<Profile>,
    persistence: Arc<dyn LocalStore>,
}

impl std::fmt::Debug for ShopperSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopperSession")
            .field("shopper", &self.shopper)
            .field("cart", &self.cart)
            .field("favorites", &self.favorites)
            .finish_non_exhaustive()
    }
}

impl ShopperSession {
    /// Restore the shopper's persisted state.
    pub fn open(persistence: Arc<dyn LocalStore>, shopper: ShopperId) -> Self {
        let cart = CartStore::load(
            Arc::clone(&persistence),
            keys::namespaced(&shopper, keys::CART),
        );
        let favorites = FavoritesStore::load(
            Arc::clone(&persistence),
            keys::namespaced(&shopper, keys::FAVORITES),
        );
        let profile = load_json(
            persistence.as_ref(),
            &keys::namespaced(&shopper, keys::USER),
        );
        Self {
            shopper,
            cart,
            favorites,
            profile,
            persistence,
        }
    }

    #[must_use]
    pub const fn shopper(&self) -> &ShopperId {
        &self.shopper
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Validate and remember buyer details.
    ///
    /// # Errors
    ///
    /// Returns the failed fields; nothing is saved in that case.
    pub fn save_profile(&mut self, profile: Profile) -> Result<&Profile, FieldErrors> {
        let profile = profile.validated()?;
        save_json(
            self.persistence.as_ref(),
            &keys::namespaced(&self.shopper, keys::USER),
            &profile,
        );
        Ok(self.profile.insert(profile))
    }

    /// Drop in-memory state. Persisted state is kept.
    pub fn close(self) {}

    /// Drop in-memory state and delete everything persisted for the shopper.
    pub fn forget(self) {
        forget_shopper(self.persistence.as_ref(), &self.shopper);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kaay_core::{Price, ProductId};
    use kaay_data::MemoryLocalStore;

    use super::*;
    use crate::store::CartItemInput;

    fn profile() -> Profile {
        Profile {
            name: "Awa Diop".to_string(),
            phone: "77 123 45 67".to_string(),
            address: "Rue 10, Medina".to_string(),
            city: "Dakar".to_string(),
        }
    }

    fn add_tee(session: &mut ShopperSession) {
        session.cart.add_item(CartItemInput {
            product_id: ProductId::new("p1"),
            name: "Tee".to_string(),
            price: Price::new(5000),
            original_price: None,
            image_url: None,
            size: "M".to_string(),
            color: "Noir".to_string(),
            quantity: None,
        });
    }

    #[test]
    fn test_state_survives_reopen() {
        let persistence: Arc<dyn LocalStore> = Arc::new(MemoryLocalStore::new());
        let shopper = ShopperId::new("s1");

        let mut session = ShopperSession::open(Arc::clone(&persistence), shopper.clone());
        add_tee(&mut session);
        session.favorites.add(ProductId::new("p2"));
        session.save_profile(profile()).unwrap();
        session.close();

        let session = ShopperSession::open(Arc::clone(&persistence), shopper);
        assert_eq!(session.cart.item_count(), 1);
        assert_eq!(session.favorites.count(), 1);
        assert_eq!(session.profile().unwrap().phone, "771234567");
    }

    #[test]
    fn test_shoppers_are_isolated() {
        let persistence: Arc<dyn LocalStore> = Arc::new(MemoryLocalStore::new());
        let mut first = ShopperSession::open(Arc::clone(&persistence), ShopperId::new("a"));
        add_tee(&mut first);

        let second = ShopperSession::open(Arc::clone(&persistence), ShopperId::new("b"));
        assert!(second.cart.is_empty());
    }

    #[test]
    fn test_forget_deletes_persisted_state() {
        let persistence: Arc<dyn LocalStore> = Arc::new(MemoryLocalStore::new());
        let shopper = ShopperId::new("s1");
        let mut session = ShopperSession::open(Arc::clone(&persistence), shopper.clone());
        add_tee(&mut session);
        session.save_profile(profile()).unwrap();
        session.forget();

        let session = ShopperSession::open(persistence, shopper);
        assert!(session.cart.is_empty());
        assert!(session.profile().is_none());
    }

    #[test]
    fn test_invalid_profile_is_not_saved() {
        let persistence: Arc<dyn LocalStore> = Arc::new(MemoryLocalStore::new());
        let mut session = ShopperSession::open(persistence, ShopperId::new("s1"));
        let errors = session
            .save_profile(Profile {
                phone: "12".to_string(),
                ..profile()
            })
            .unwrap_err();
        assert!(errors.get("phone").is_some());
        assert!(session.profile().is_none());
    }
}
