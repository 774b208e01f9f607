//! Order submission.

use serde_json::Value;

use crate::api::{ApiCore, ApiRequest, Resource};
use crate::datetime::DeliveryTime;
use crate::error::Result;
use crate::types::{Address, AddressForm, CreditCard, Tray, WireFields};
use crate::validation::Validation;

/// Who is placing the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderAccount {
    /// No account; the receipt goes to `email`.
    Guest { email: String },
    /// The configured account. The request is signed with its credentials.
    User,
}

/// Everything needed to place one order.
#[derive(Debug, Clone)]
pub struct OrderSubmission {
    pub restaurant_id: String,
    pub tray: Tray,
    /// Whole or two-decimal amount; empty means no tip.
    pub tip: String,
    pub delivery: DeliveryTime,
    pub first_name: String,
    pub last_name: String,
    pub address: Address,
    pub card: CreditCard,
    pub account: OrderAccount,
}

#[derive(Debug, Clone, Copy)]
pub struct Order<'a> {
    core: &'a ApiCore,
}

impl<'a> Order<'a> {
    pub fn new(core: &'a ApiCore) -> Self {
        Self { core }
    }

    /// `POST /o/{rid}`
    pub fn build_submit(&self, order: &OrderSubmission) -> Result<ApiRequest> {
        let email = match &order.account {
            OrderAccount::Guest { email } => email.clone(),
            OrderAccount::User => self.core.account_email()?.to_string(),
        };
        let tip = if order.tip.trim().is_empty() {
            "0"
        } else {
            order.tip.as_str()
        };

        let mut v = Validation::new("Order Submit");
        v.numeric_id(&order.restaurant_id, "Restaurant ID")
            .money(tip, "Tip")
            .required(&order.first_name, "First Name")
            .required(&order.last_name, "Last Name")
            .email(&email)
            .absorb(order.tray.validate())
            .absorb(order.address.validate())
            .absorb(order.card.validate());
        v.finish()?;

        let mut form: WireFields = vec![
            ("tray".to_string(), order.tray.to_wire()),
            ("tip".to_string(), tip.to_string()),
            ("delivery_date".to_string(), order.delivery.date_field()),
        ];
        if let Some(time) = order.delivery.time_field() {
            form.push(("delivery_time".to_string(), time));
        }
        form.push(("first_name".to_string(), order.first_name.clone()));
        form.push(("last_name".to_string(), order.last_name.clone()));
        form.extend(order.address.wire_fields(AddressForm::Delivery));
        form.push(("em".to_string(), email));
        form.extend(order.card.order_fields());

        let request = ApiRequest::post(Resource::Order, ["o", order.restaurant_id.as_str()])
            .with_form(form);
        Ok(match order.account {
            OrderAccount::Guest { .. } => request,
            OrderAccount::User => request.with_user_auth(),
        })
    }

    /// Place the order. The response carries the service's reference number.
    pub fn submit(&self, order: &OrderSubmission) -> Result<Value> {
        self.core.call(&self.build_submit(order)?)
    }
}
