use std::fmt;

use chrono::{Local, NaiveDate};

use super::{Address, AddressForm, WireFields};
use crate::error::Result;
use crate::validation::{normalize_year, strip_card_separators, Validation};

/// Card network, derived from the number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    Visa,
    MasterCard,
    AmericanExpress,
    Discover,
    Unknown,
}

impl CardType {
    pub fn from_number(number: &str) -> Self {
        let digits = strip_card_separators(number);
        let prefix = |n: usize| digits.get(..n).and_then(|p| p.parse::<u32>().ok());
        match (prefix(1), prefix(2), prefix(4)) {
            (Some(4), _, _) => CardType::Visa,
            (_, Some(34 | 37), _) => CardType::AmericanExpress,
            (_, Some(51..=55), _) => CardType::MasterCard,
            (_, _, Some(2221..=2720)) => CardType::MasterCard,
            (_, Some(65), _) | (_, _, Some(6011)) => CardType::Discover,
            _ => CardType::Unknown,
        }
    }
}

/// A payment card with its billing address.
///
/// `Debug` never prints the number or CVC.
#[derive(Clone, PartialEq, Eq)]
pub struct CreditCard {
    pub name: String,
    pub expiry_month: u32,
    pub expiry_year: u32,
    pub billing: Address,
    pub number: String,
    pub cvc: String,
}

impl fmt::Debug for CreditCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditCard")
            .field("name", &self.name)
            .field("number", &format_args!("****{}", self.last_four()))
            .field("cvc", &"[REDACTED]")
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("billing", &self.billing)
            .finish()
    }
}

impl CreditCard {
    pub fn new(
        name: impl Into<String>,
        expiry_month: u32,
        expiry_year: u32,
        billing: Address,
        number: impl Into<String>,
        cvc: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            expiry_month,
            expiry_year,
            billing,
            number: number.into(),
            cvc: cvc.into(),
        }
    }

    /// Validate against the current local date.
    pub fn validate(&self) -> Result<()> {
        self.validate_at(Local::now().date_naive())
    }

    /// Validate as if today were `today`. The billing address is checked too.
    pub fn validate_at(&self, today: NaiveDate) -> Result<()> {
        let mut v = Validation::new("Credit Card");
        v.required(&self.name, "Name")
            .card_number(&self.number)
            .cvc(&self.cvc)
            .expiration_date(self.expiry_month, self.expiry_year, today)
            .absorb(self.billing.validate());
        v.finish()
    }

    pub fn card_type(&self) -> CardType {
        CardType::from_number(&self.number)
    }

    pub fn last_four(&self) -> String {
        let digits = strip_card_separators(&self.number);
        let skip = digits.chars().count().saturating_sub(4);
        digits.chars().skip(skip).collect()
    }

    /// The card number with separators removed.
    pub fn digits(&self) -> String {
        strip_card_separators(&self.number)
    }

    /// Four-digit expiry year, two-digit years read as 20YY.
    pub fn full_expiry_year(&self) -> u32 {
        normalize_year(self.expiry_year)
            .and_then(|y| u32::try_from(y).ok())
            .unwrap_or(self.expiry_year)
    }

    /// `MM/YYYY`.
    pub fn expiry(&self) -> String {
        format!("{:02}/{}", self.expiry_month, self.full_expiry_year())
    }

    /// Fields for storing the card on a user account.
    pub fn stored_fields(&self) -> WireFields {
        let mut fields = vec![
            ("name".to_string(), self.name.clone()),
            ("number".to_string(), self.digits()),
            ("cvc".to_string(), self.cvc.clone()),
            ("expiry_month".to_string(), format!("{:02}", self.expiry_month)),
            ("expiry_year".to_string(), self.full_expiry_year().to_string()),
        ];
        fields.extend(self.billing.wire_fields(AddressForm::Billing));
        fields
    }

    /// Fields for paying for an order.
    pub fn order_fields(&self) -> WireFields {
        let mut fields = vec![
            ("card_name".to_string(), self.name.clone()),
            ("card_number".to_string(), self.digits()),
            ("card_cvc".to_string(), self.cvc.clone()),
            ("card_expiry".to_string(), self.expiry()),
        ];
        fields.extend(self.billing.wire_fields(AddressForm::OrderBilling));
        fields
    }
}
