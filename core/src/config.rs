//! Client configuration: API key, server environment, user credentials.
//!
//! # Environment Variables
//! - `ORDRIN_API_KEY` - developer API key (required)
//! - `ORDRIN_SERVERS` - `production`, `test` or `custom` (default: `test`)
//! - `ORDRIN_RESTAURANT_URL`, `ORDRIN_USER_URL`, `ORDRIN_ORDER_URL` - required
//!   when `ORDRIN_SERVERS=custom`
//! - `ORDRIN_EMAIL`, `ORDRIN_PASSWORD` - user credentials, both or neither
//!
//! Configuration is read once at construction and never mutated afterwards.

use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::api::Resource;
use crate::error::{OrdrinError, Result};
use crate::validation::is_email;

const PRODUCTION_RESTAURANT_URL: &str = "https://r.ordr.in";
const PRODUCTION_USER_URL: &str = "https://u.ordr.in";
const PRODUCTION_ORDER_URL: &str = "https://o.ordr.in";
const TEST_RESTAURANT_URL: &str = "https://r-test.ordr.in";
const TEST_USER_URL: &str = "https://u-test.ordr.in";
const TEST_ORDER_URL: &str = "https://o-test.ordr.in";

/// One base URL per resource group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrls {
    restaurant: String,
    user: String,
    order: String,
}

impl BaseUrls {
    /// Each URL must be an absolute `http` or `https` URL. A trailing `/` is dropped.
    pub fn new(restaurant: &str, user: &str, order: &str) -> Result<Self> {
        Ok(Self {
            restaurant: checked_base_url("restaurant", restaurant)?,
            user: checked_base_url("user", user)?,
            order: checked_base_url("order", order)?,
        })
    }

    pub fn get(&self, resource: Resource) -> &str {
        match resource {
            Resource::Restaurant => &self.restaurant,
            Resource::User => &self.user,
            Resource::Order => &self.order,
        }
    }
}

fn checked_base_url(label: &str, raw: &str) -> Result<String> {
    let url = Url::parse(raw)
        .map_err(|e| OrdrinError::Config(format!("invalid {label} URL {raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(OrdrinError::Config(format!(
            "{label} URL {raw:?} must use http or https"
        )));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Which deployment of the service to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Servers {
    Production,
    Test,
    Custom(BaseUrls),
}

impl Servers {
    pub fn custom(restaurant: &str, user: &str, order: &str) -> Result<Self> {
        Ok(Servers::Custom(BaseUrls::new(restaurant, user, order)?))
    }

    pub fn base_url(&self, resource: Resource) -> &str {
        match (self, resource) {
            (Servers::Production, Resource::Restaurant) => PRODUCTION_RESTAURANT_URL,
            (Servers::Production, Resource::User) => PRODUCTION_USER_URL,
            (Servers::Production, Resource::Order) => PRODUCTION_ORDER_URL,
            (Servers::Test, Resource::Restaurant) => TEST_RESTAURANT_URL,
            (Servers::Test, Resource::User) => TEST_USER_URL,
            (Servers::Test, Resource::Order) => TEST_ORDER_URL,
            (Servers::Custom(urls), resource) => urls.get(resource),
        }
    }
}

impl FromStr for Servers {
    type Err = OrdrinError;

    /// Parses `production`/`prod` and `test`. Custom servers need URLs and
    /// are built with [`Servers::custom`].
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Servers::Production),
            "test" => Ok(Servers::Test),
            "custom" => Err(OrdrinError::Config(
                "custom servers require restaurant, user and order URLs".to_string(),
            )),
            other => Err(OrdrinError::Config(format!("unknown server set {other:?}"))),
        }
    }
}

/// Account credentials used to sign user requests.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: SecretString,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// The email ends up in a path segment and a quoted header parameter, so
    /// it must be a plain address without quotes or control characters.
    pub fn check(&self) -> Result<()> {
        let email = self.email.as_str();
        if is_email(email) && !email.contains('"') && !email.chars().any(char::is_control) {
            Ok(())
        } else {
            Err(OrdrinError::Config(format!(
                "account email {email:?} is not a valid email address"
            )))
        }
    }
}

/// Everything a client needs, fixed at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    api_key: String,
    servers: Servers,
    credentials: Option<Credentials>,
}

impl ClientConfig {
    /// An empty `api_key` means no client identification header is sent.
    pub fn new(api_key: impl Into<String>, servers: Servers) -> Self {
        Self {
            api_key: api_key.into(),
            servers,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`] but reads variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| {
                OrdrinError::Config(format!("missing environment variable {name}"))
            })
        };

        let api_key = required("ORDRIN_API_KEY")?;
        let servers = match var("ORDRIN_SERVERS").as_deref() {
            None => Servers::Test,
            Some(s) if s.trim().eq_ignore_ascii_case("custom") => Servers::custom(
                &required("ORDRIN_RESTAURANT_URL")?,
                &required("ORDRIN_USER_URL")?,
                &required("ORDRIN_ORDER_URL")?,
            )?,
            Some(s) => s.parse()?,
        };

        let mut config = Self::new(api_key, servers);
        match (var("ORDRIN_EMAIL"), var("ORDRIN_PASSWORD")) {
            (Some(email), Some(password)) => {
                let credentials = Credentials::new(email, password);
                credentials.check()?;
                config = config.with_credentials(credentials);
            }
            (None, None) => {}
            _ => {
                return Err(OrdrinError::Config(
                    "ORDRIN_EMAIL and ORDRIN_PASSWORD must be set together".to_string(),
                ))
            }
        }
        Ok(config)
    }

    pub fn api_key(&self) -> Option<&str> {
        Some(self.api_key.as_str()).filter(|k| !k.is_empty())
    }

    pub fn servers(&self) -> &Servers {
        &self.servers
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn base_url(&self, resource: Resource) -> &str {
        self.servers.base_url(resource)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn production_urls() {
        let s = Servers::Production;
        assert_eq!(s.base_url(Resource::Restaurant), "https://r.ordr.in");
        assert_eq!(s.base_url(Resource::User), "https://u.ordr.in");
        assert_eq!(s.base_url(Resource::Order), "https://o.ordr.in");
    }

    #[test]
    fn test_urls() {
        let s: Servers = "test".parse().unwrap();
        assert_eq!(s.base_url(Resource::Restaurant), "https://r-test.ordr.in");
        assert_eq!(s.base_url(Resource::User), "https://u-test.ordr.in");
        assert_eq!(s.base_url(Resource::Order), "https://o-test.ordr.in");
    }

    #[test]
    fn custom_urls_strip_trailing_slash() {
        let s = Servers::custom("http://localhost:1/", "http://localhost:2", "https://o.example//")
            .unwrap();
        assert_eq!(s.base_url(Resource::Restaurant), "http://localhost:1");
        assert_eq!(s.base_url(Resource::Order), "https://o.example");
    }

    #[test]
    fn custom_urls_must_be_http() {
        assert!(matches!(
            Servers::custom("ftp://x", "http://u", "http://o"),
            Err(OrdrinError::Config(_))
        ));
        assert!(Servers::custom("not a url", "http://u", "http://o").is_err());
    }

    #[test]
    fn custom_cannot_be_parsed_without_urls() {
        assert!("custom".parse::<Servers>().is_err());
        assert!("staging".parse::<Servers>().is_err());
    }

    #[test]
    fn empty_api_key_is_absent() {
        assert_eq!(ClientConfig::new("", Servers::Test).api_key(), None);
        assert_eq!(ClientConfig::new("k", Servers::Test).api_key(), Some("k"));
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let rendered = format!("{:?}", Credentials::new("a@b.co", "hunter2"));
        assert!(rendered.contains("a@b.co"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn credentials_check_rejects_header_breaking_emails() {
        assert!(Credentials::new("jane+orders@example.com", "pw").check().is_ok());
        for email in ["me\r\n@x.com", "me\"@x.com", "no-at-sign", "a@b.co\u{7f}", ""] {
            assert!(
                matches!(Credentials::new(email, "pw").check(), Err(OrdrinError::Config(_))),
                "{email:?}"
            );
        }
    }

    #[test]
    fn from_lookup_defaults_to_test_servers() {
        let config = ClientConfig::from_lookup(lookup(&[("ORDRIN_API_KEY", "key")])).unwrap();
        assert_eq!(config.servers(), &Servers::Test);
        assert!(config.credentials().is_none());
    }

    #[test]
    fn from_lookup_reads_custom_servers_and_credentials() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ORDRIN_API_KEY", "key"),
            ("ORDRIN_SERVERS", "custom"),
            ("ORDRIN_RESTAURANT_URL", "http://127.0.0.1:9000"),
            ("ORDRIN_USER_URL", "http://127.0.0.1:9001"),
            ("ORDRIN_ORDER_URL", "http://127.0.0.1:9002"),
            ("ORDRIN_EMAIL", "me@example.com"),
            ("ORDRIN_PASSWORD", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.base_url(Resource::User), "http://127.0.0.1:9001");
        assert_eq!(config.credentials().unwrap().email(), "me@example.com");
        assert_eq!(config.credentials().unwrap().password(), "secret");
    }

    #[test]
    fn from_lookup_rejects_missing_key_and_half_credentials() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[])),
            Err(OrdrinError::Config(_))
        ));
        assert!(ClientConfig::from_lookup(lookup(&[
            ("ORDRIN_API_KEY", "key"),
            ("ORDRIN_EMAIL", "me@example.com"),
        ]))
        .is_err());
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[
                ("ORDRIN_API_KEY", "key"),
                ("ORDRIN_EMAIL", "me\"quoted@example.com"),
                ("ORDRIN_PASSWORD", "pw"),
            ])),
            Err(OrdrinError::Config(_))
        ));
    }
}
