use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::WireFields;
use crate::error::Result;
use crate::validation::Validation;

static ZIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("valid regex"));
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?\d{3}\)?[- .]?\d{3}[- .]?\d{4}$").expect("valid regex")
});
static STATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2}$").expect("valid regex"));

/// Which field names an address is rendered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressForm {
    /// `addr`, `addr2`, `city`, `state`, `zip`, `phone`.
    Delivery,
    /// `bill_addr` ... `bill_zip`, used when storing a card.
    Billing,
    /// `card_bill_addr` ... `card_bill_zip`, used when placing an order.
    OrderBilling,
}

impl AddressForm {
    fn prefix(self) -> &'static str {
        match self {
            AddressForm::Delivery => "",
            AddressForm::Billing => "bill_",
            AddressForm::OrderBilling => "card_bill_",
        }
    }
}

/// A US street address with a contact phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
}

impl Address {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            street2: None,
            city: city.into(),
            state: state.into(),
            zip: zip.into(),
            phone: phone.into(),
        }
    }

    pub fn with_street2(mut self, street2: impl Into<String>) -> Self {
        self.street2 = Some(street2.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        let mut v = Validation::new("Address");
        v.required(&self.street, "Street")
            .required(&self.city, "City")
            .matches(&self.state, &STATE, "State", "must be a two-letter state code")
            .matches(&self.zip, &ZIP, "Zip", "must be a 5 digit or ZIP+4 postal code")
            .matches(&self.phone, &PHONE, "Phone", "must be a 10 digit phone number");
        v.finish()
    }

    /// Render under the given field names. A missing `street2` is sent empty;
    /// billing forms carry no phone.
    pub fn wire_fields(&self, form: AddressForm) -> WireFields {
        let prefix = form.prefix();
        let mut fields = vec![
            (format!("{prefix}addr"), self.street.clone()),
            (
                format!("{prefix}addr2"),
                self.street2.clone().unwrap_or_default(),
            ),
            (format!("{prefix}city"), self.city.clone()),
            (format!("{prefix}state"), self.state.clone()),
            (format!("{prefix}zip"), self.zip.clone()),
        ];
        if form == AddressForm::Delivery {
            fields.push(("phone".to_string(), self.phone.clone()));
        }
        fields
    }
}
