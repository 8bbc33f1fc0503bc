use actix_session::Session;

use crate::{errors::ApiError, models::CartEntry};

const CART_KEY: &str = "cart";

/// Session-backed cart repository. The cart never touches the database; it
/// lives in the cookie session and is scoped to the browser session of the
/// authenticated principal.
pub struct SessionCart {
    session: Session,
}

impl SessionCart {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Current entries; a missing or malformed value reads as an empty cart.
    pub fn entries(&self) -> Vec<CartEntry> {
        self.session
            .get::<Vec<CartEntry>>(CART_KEY)
            .unwrap_or(None)
            .unwrap_or_default()
    }

    /// Adds a product, accumulating quantity when it is already present.
    pub fn add(&self, product_id: i64, quantity: i64) -> Result<(), ApiError> {
        let mut entries = self.entries();
        accumulate(&mut entries, product_id, quantity);
        self.store(entries)
    }

    /// Removes a product; absent entries are a no-op.
    pub fn remove(&self, product_id: i64) -> Result<(), ApiError> {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|entry| entry.product_id != product_id);
        if entries.len() != before {
            self.store(entries)?;
        }
        Ok(())
    }

    pub fn clear(&self) {
        self.session.remove(CART_KEY);
    }

    fn store(&self, entries: Vec<CartEntry>) -> Result<(), ApiError> {
        self.session
            .insert(CART_KEY, entries)
            .map_err(|e| ApiError::Session(e.to_string()))
    }
}

fn accumulate(entries: &mut Vec<CartEntry>, product_id: i64, quantity: i64) {
    if let Some(entry) = entries.iter_mut().find(|e| e.product_id == product_id) {
        entry.quantity += quantity;
    } else {
        entries.push(CartEntry {
            product_id,
            quantity,
        });
    }
}
