//! Blocking client for the Ordr.in food-ordering API.
//!
//! # Overview
//! Restaurant search, delivery checks and fee quotes, user account
//! management and order submission, exposed as method calls that validate
//! their inputs, build the request and return the decoded JSON body.
//!
//! # Design
//! - Every façade operation is split into `build_*` (validation and
//!   request description, no I/O) and the call itself, so requests can be
//!   inspected or executed by a caller-supplied [`Transport`].
//! - Validation never stops at the first problem; a [`OrdrinError::BadValue`]
//!   lists everything wrong and is raised before any network traffic.
//! - Responses are returned as [`serde_json::Value`]; their schema belongs
//!   to the caller.
//!
//! ```no_run
//! use ordrin_core::{Address, ClientConfig, DeliveryTime, Ordrin, Servers};
//!
//! let client = Ordrin::new(ClientConfig::new("my-api-key", Servers::Test));
//! let home = Address::new("1 Main St", "College Station", "TX", "77840", "5555555555");
//! let restaurants = client.restaurant().delivery_list(&DeliveryTime::Asap, &home)?;
//! # Ok::<(), ordrin_core::OrdrinError>(())
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod datetime;
pub mod error;
pub mod http;
pub mod order;
pub mod restaurant;
pub mod transport;
pub mod types;
pub mod user;
pub mod validation;

pub use api::{ApiCore, ApiRequest, Resource};
pub use client::Ordrin;
pub use config::{BaseUrls, ClientConfig, Credentials, Servers};
pub use datetime::{format_date, format_datetime, format_time, DeliveryTime};
pub use error::{OrdrinError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use order::{Order, OrderAccount, OrderSubmission};
pub use restaurant::Restaurant;
pub use transport::{Transport, UreqTransport};
pub use types::{Address, AddressForm, CardType, CreditCard, Tray, TrayItem};
pub use user::User;
pub use validation::Validation;
