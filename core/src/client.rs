//! Entry point tying configuration, transport and façades together.
//!
//! # Design
//! `Ordrin` owns a single [`ApiCore`]; the façades returned by
//! [`Ordrin::restaurant`], [`Ordrin::user`] and [`Ordrin::order`] borrow it.
//! Nothing is mutated after construction, so one client may be shared
//! across threads.

use crate::api::ApiCore;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::order::Order;
use crate::restaurant::Restaurant;
use crate::transport::{Transport, UreqTransport};
use crate::user::User;

#[derive(Debug)]
pub struct Ordrin {
    core: ApiCore,
}

impl Ordrin {
    /// A client using the bundled blocking transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            core: ApiCore::new(config, transport),
        }
    }

    /// Configuration read from `ORDRIN_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    pub fn config(&self) -> &ClientConfig {
        self.core.config()
    }

    pub fn core(&self) -> &ApiCore {
        &self.core
    }

    pub fn restaurant(&self) -> Restaurant<'_> {
        Restaurant::new(&self.core)
    }

    pub fn user(&self) -> User<'_> {
        User::new(&self.core)
    }

    pub fn order(&self) -> Order<'_> {
        Order::new(&self.core)
    }
}
