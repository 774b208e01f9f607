//! Restaurant search, delivery checks and fee quotes.

use serde_json::Value;

use crate::api::{ApiCore, ApiRequest, Resource};
use crate::datetime::DeliveryTime;
use crate::error::Result;
use crate::types::Address;
use crate::validation::Validation;

/// Façade over the restaurant service. None of these calls are signed.
#[derive(Debug, Clone, Copy)]
pub struct Restaurant<'a> {
    core: &'a ApiCore,
}

impl<'a> Restaurant<'a> {
    pub fn new(core: &'a ApiCore) -> Self {
        Self { core }
    }

    /// `GET /dl/{time}/{zip}/{city}/{street}`
    pub fn build_delivery_list(
        &self,
        time: &DeliveryTime,
        address: &Address,
    ) -> Result<ApiRequest> {
        let mut v = Validation::new("Restaurant DeliveryList");
        v.absorb(address.validate());
        v.finish()?;

        Ok(ApiRequest::get(
            Resource::Restaurant,
            [
                "dl".to_string(),
                time.datetime_segment(),
                address.zip.clone(),
                address.city.clone(),
                address.street.clone(),
            ],
        ))
    }

    /// Restaurants delivering to `address` at `time`.
    pub fn delivery_list(&self, time: &DeliveryTime, address: &Address) -> Result<Value> {
        self.core.call(&self.build_delivery_list(time, address)?)
    }

    /// `GET /dc/{rid}/{time}/{zip}/{city}/{street}`
    pub fn build_delivery_check(
        &self,
        restaurant_id: &str,
        time: &DeliveryTime,
        address: &Address,
    ) -> Result<ApiRequest> {
        let mut v = Validation::new("Restaurant DeliveryCheck");
        v.numeric_id(restaurant_id, "Restaurant ID")
            .absorb(address.validate());
        v.finish()?;

        Ok(ApiRequest::get(
            Resource::Restaurant,
            [
                "dc".to_string(),
                restaurant_id.to_string(),
                time.datetime_segment(),
                address.zip.clone(),
                address.city.clone(),
                address.street.clone(),
            ],
        ))
    }

    /// Whether one restaurant delivers to `address` at `time`.
    pub fn delivery_check(
        &self,
        restaurant_id: &str,
        time: &DeliveryTime,
        address: &Address,
    ) -> Result<Value> {
        self.core
            .call(&self.build_delivery_check(restaurant_id, time, address)?)
    }

    /// `GET /fee/{rid}/{subtotal}/{tip}/{time}/{zip}/{city}/{street}`
    ///
    /// Amounts are whole (`12`) or two-decimal (`12.50`) strings. An empty
    /// tip is sent as `0`.
    pub fn build_delivery_fee(
        &self,
        restaurant_id: &str,
        subtotal: &str,
        tip: &str,
        time: &DeliveryTime,
        address: &Address,
    ) -> Result<ApiRequest> {
        let tip = if tip.trim().is_empty() { "0" } else { tip };

        let mut v = Validation::new("Restaurant DeliveryFee");
        v.numeric_id(restaurant_id, "Restaurant ID")
            .money(subtotal, "Subtotal")
            .money(tip, "Tip")
            .absorb(address.validate());
        v.finish()?;

        Ok(ApiRequest::get(
            Resource::Restaurant,
            [
                "fee".to_string(),
                restaurant_id.to_string(),
                subtotal.to_string(),
                tip.to_string(),
                time.datetime_segment(),
                address.zip.clone(),
                address.city.clone(),
                address.street.clone(),
            ],
        ))
    }

    /// Delivery fee and tax for an order of `subtotal` plus `tip`.
    pub fn delivery_fee(
        &self,
        restaurant_id: &str,
        subtotal: &str,
        tip: &str,
        time: &DeliveryTime,
        address: &Address,
    ) -> Result<Value> {
        self.core.call(&self.build_delivery_fee(
            restaurant_id,
            subtotal,
            tip,
            time,
            address,
        )?)
    }

    /// `GET /rd/{rid}`
    pub fn build_details(&self, restaurant_id: &str) -> Result<ApiRequest> {
        let mut v = Validation::new("Restaurant Details");
        v.numeric_id(restaurant_id, "Restaurant ID");
        v.finish()?;

        Ok(ApiRequest::get(Resource::Restaurant, ["rd", restaurant_id]))
    }

    /// Restaurant information and full menu.
    pub fn details(&self, restaurant_id: &str) -> Result<Value> {
        self.core.call(&self.build_details(restaurant_id)?)
    }
}
