//! Value objects the caller builds and the façades validate and serialize.
//!
//! # Design
//! Each type is a plain field-typed struct. `validate` collects every
//! violation into a single `BadValue`; wire-form methods render the exact
//! field names and order the service expects. Nothing is validated at
//! construction time, only at the point of use.

mod address;
mod credit_card;
mod tray;

pub use address::{Address, AddressForm};
pub use credit_card::{CardType, CreditCard};
pub use tray::{Tray, TrayItem};

/// Ordered `(name, value)` pairs for a form-encoded body.
pub type WireFields = Vec<(String, String)>;
