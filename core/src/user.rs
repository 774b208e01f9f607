//! User accounts: creation, saved addresses and cards, order history.
//!
//! Everything except [`User::create`] acts on the account configured in
//! [`ClientConfig`](crate::ClientConfig) and is signed with its credentials.
//! The client never changes its own configuration, so after
//! [`User::update_password`] succeeds build a new client with the new
//! password.

use serde_json::Value;

use crate::api::{ApiCore, ApiRequest, Resource};
use crate::error::Result;
use crate::http::HttpMethod;
use crate::types::{Address, AddressForm, CreditCard};
use crate::validation::Validation;

#[derive(Debug, Clone, Copy)]
pub struct User<'a> {
    core: &'a ApiCore,
}

impl<'a> User<'a> {
    pub fn new(core: &'a ApiCore) -> Self {
        Self { core }
    }

    /// A signed request under `/u/{email}/...`.
    fn signed(&self, method: HttpMethod, rest: &[&str]) -> Result<ApiRequest> {
        let email = self.core.account_email()?;
        let mut segments = vec!["u".to_string(), email.to_string()];
        segments.extend(rest.iter().map(|s| s.to_string()));
        Ok(ApiRequest::new(Resource::User, method, segments).with_user_auth())
    }

    fn nickname(context: &str, nick: &str) -> Result<()> {
        let mut v = Validation::new(context);
        v.required(nick, "Nickname");
        v.finish()
    }

    /// `POST /u/{email}` with `pw`, `first_name`, `last_name`. Not signed.
    pub fn build_create(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<ApiRequest> {
        let mut v = Validation::new("User Create");
        v.email(email)
            .required(password, "Password")
            .required(first_name, "First Name")
            .required(last_name, "Last Name");
        v.finish()?;

        Ok(ApiRequest::post(Resource::User, ["u", email]).with_form(vec![
            ("pw".to_string(), password.to_string()),
            ("first_name".to_string(), first_name.to_string()),
            ("last_name".to_string(), last_name.to_string()),
        ]))
    }

    /// Register a new account. Works without configured credentials.
    pub fn create(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Value> {
        self.core
            .call(&self.build_create(email, password, first_name, last_name)?)
    }

    /// `GET /u/{email}`
    pub fn build_account_info(&self) -> Result<ApiRequest> {
        self.signed(HttpMethod::Get, &[])
    }

    /// Name and email of the configured account.
    pub fn account_info(&self) -> Result<Value> {
        self.core.call(&self.build_account_info()?)
    }

    /// `GET /u/{email}/addrs`
    pub fn build_addresses(&self) -> Result<ApiRequest> {
        self.signed(HttpMethod::Get, &["addrs"])
    }

    /// Every saved address.
    pub fn addresses(&self) -> Result<Value> {
        self.core.call(&self.build_addresses()?)
    }

    /// `GET /u/{email}/addrs/{nick}`
    pub fn build_address(&self, nick: &str) -> Result<ApiRequest> {
        Self::nickname("User GetAddress", nick)?;
        self.signed(HttpMethod::Get, &["addrs", nick])
    }

    /// The address saved under `nick`.
    pub fn address(&self, nick: &str) -> Result<Value> {
        self.core.call(&self.build_address(nick)?)
    }

    /// `PUT /u/{email}/addrs/{nick}` with the address fields.
    pub fn build_set_address(&self, nick: &str, address: &Address) -> Result<ApiRequest> {
        let mut v = Validation::new("User SetAddress");
        v.required(nick, "Nickname").absorb(address.validate());
        v.finish()?;

        Ok(self
            .signed(HttpMethod::Put, &["addrs", nick])?
            .with_form(address.wire_fields(AddressForm::Delivery)))
    }

    /// Create or replace the address saved under `nick`.
    pub fn set_address(&self, nick: &str, address: &Address) -> Result<Value> {
        self.core.call(&self.build_set_address(nick, address)?)
    }

    /// `DELETE /u/{email}/addrs/{nick}`
    pub fn build_delete_address(&self, nick: &str) -> Result<ApiRequest> {
        Self::nickname("User DeleteAddress", nick)?;
        self.signed(HttpMethod::Delete, &["addrs", nick])
    }

    /// Remove the address saved under `nick`.
    pub fn delete_address(&self, nick: &str) -> Result<Value> {
        self.core.call(&self.build_delete_address(nick)?)
    }

    /// `GET /u/{email}/ccs`
    pub fn build_cards(&self) -> Result<ApiRequest> {
        self.signed(HttpMethod::Get, &["ccs"])
    }

    /// Every saved card, numbers masked by the service.
    pub fn cards(&self) -> Result<Value> {
        self.core.call(&self.build_cards()?)
    }

    /// `GET /u/{email}/ccs/{nick}`
    pub fn build_card(&self, nick: &str) -> Result<ApiRequest> {
        Self::nickname("User GetCard", nick)?;
        self.signed(HttpMethod::Get, &["ccs", nick])
    }

    /// The card saved under `nick`, number masked by the service.
    pub fn card(&self, nick: &str) -> Result<Value> {
        self.core.call(&self.build_card(nick)?)
    }

    /// `PUT /u/{email}/ccs/{nick}` with the card and billing fields.
    pub fn build_set_card(&self, nick: &str, card: &CreditCard) -> Result<ApiRequest> {
        let mut v = Validation::new("User SetCard");
        v.required(nick, "Nickname").absorb(card.validate());
        v.finish()?;

        Ok(self
            .signed(HttpMethod::Put, &["ccs", nick])?
            .with_form(card.stored_fields()))
    }

    /// Create or replace the card saved under `nick`.
    pub fn set_card(&self, nick: &str, card: &CreditCard) -> Result<Value> {
        self.core.call(&self.build_set_card(nick, card)?)
    }

    /// `DELETE /u/{email}/ccs/{nick}`
    pub fn build_delete_card(&self, nick: &str) -> Result<ApiRequest> {
        Self::nickname("User DeleteCard", nick)?;
        self.signed(HttpMethod::Delete, &["ccs", nick])
    }

    /// Remove the card saved under `nick`.
    pub fn delete_card(&self, nick: &str) -> Result<Value> {
        self.core.call(&self.build_delete_card(nick)?)
    }

    /// `GET /u/{email}/orders`
    pub fn build_order_history(&self) -> Result<ApiRequest> {
        self.signed(HttpMethod::Get, &["orders"])
    }

    /// Every order placed by the configured account.
    pub fn order_history(&self) -> Result<Value> {
        self.core.call(&self.build_order_history()?)
    }

    /// `GET /u/{email}/order/{order_id}`
    pub fn build_order(&self, order_id: &str) -> Result<ApiRequest> {
        let mut v = Validation::new("User GetOrder");
        v.required(order_id, "Order ID");
        v.finish()?;
        self.signed(HttpMethod::Get, &["order", order_id])
    }

    /// One past order in detail.
    pub fn order(&self, order_id: &str) -> Result<Value> {
        self.core.call(&self.build_order(order_id)?)
    }

    /// `PUT /u/{email}/password` with `password`.
    pub fn build_update_password(&self, new_password: &str) -> Result<ApiRequest> {
        let mut v = Validation::new("User UpdatePassword");
        v.required(new_password, "Password");
        v.finish()?;

        Ok(self
            .signed(HttpMethod::Put, &["password"])?
            .with_form(vec![("password".to_string(), new_password.to_string())]))
    }

    /// Change the account password. Later calls need a client built with
    /// the new password.
    pub fn update_password(&self, new_password: &str) -> Result<Value> {
        self.core.call(&self.build_update_password(new_password)?)
    }
}
