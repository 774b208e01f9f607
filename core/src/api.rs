//! Request composition and response interpretation shared by every façade.
//!
//! # Design
//! A façade describes a call as an [`ApiRequest`]: which resource group,
//! which method, the ordered path segments, the form fields and whether the
//! call acts on the configured user account. [`ApiCore::build`] turns that
//! into an [`HttpRequest`] without any I/O, [`parse_response`] turns an
//! [`HttpResponse`] back into JSON, and [`ApiCore::call`] runs both around
//! the configured [`Transport`].

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::form_urlencoded;

use crate::auth::{client_auth_value, user_auth_value, CLIENT_AUTH_HEADER, USER_AUTH_HEADER};
use crate::config::ClientConfig;
use crate::error::{OrdrinError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Everything but the RFC 3986 unreserved characters is escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const USER_AGENT: &str = concat!("ordrin-rust/", env!("CARGO_PKG_VERSION"));

/// The service is split across three hosts, one per resource group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Restaurant,
    User,
    Order,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Restaurant => "restaurant",
            Resource::User => "user",
            Resource::Order => "order",
        })
    }
}

/// A call described before any encoding happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub resource: Resource,
    pub method: HttpMethod,
    /// Raw path segments, in order.
    pub segments: Vec<String>,
    /// Form fields, in order. Ignored for GET and DELETE.
    pub form: Vec<(String, String)>,
    /// Sign the request with the configured user credentials.
    pub user_auth: bool,
}

impl ApiRequest {
    pub fn new<S: Into<String>>(
        resource: Resource,
        method: HttpMethod,
        segments: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            resource,
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            form: Vec::new(),
            user_auth: false,
        }
    }

    pub fn get<S: Into<String>>(resource: Resource, segments: impl IntoIterator<Item = S>) -> Self {
        Self::new(resource, HttpMethod::Get, segments)
    }

    pub fn post<S: Into<String>>(
        resource: Resource,
        segments: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(resource, HttpMethod::Post, segments)
    }

    pub fn put<S: Into<String>>(resource: Resource, segments: impl IntoIterator<Item = S>) -> Self {
        Self::new(resource, HttpMethod::Put, segments)
    }

    pub fn delete<S: Into<String>>(
        resource: Resource,
        segments: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(resource, HttpMethod::Delete, segments)
    }

    pub fn with_form(mut self, form: Vec<(String, String)>) -> Self {
        self.form = form;
        self
    }

    pub fn with_user_auth(mut self) -> Self {
        self.user_auth = true;
        self
    }

    /// `/seg1/seg2/...` with every segment escaped on its own.
    pub fn path(&self) -> String {
        encode_path(self.segments.as_slice())
    }
}

/// Escape one path segment the way `rawurlencode` does.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

pub fn encode_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| format!("/{}", encode_segment(s.as_ref())))
        .collect()
}

/// `application/x-www-form-urlencoded`, spaces as `+`, field order kept.
pub fn encode_form(fields: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter())
        .finish()
}

/// Shared request builder and dispatcher. Read-only after construction.
pub struct ApiCore {
    config: ClientConfig,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for ApiCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiCore {
    pub fn new(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Email of the configured account, required by every signed user call.
    pub fn account_email(&self) -> Result<&str> {
        let credentials = self.config.credentials().ok_or_else(|| {
            OrdrinError::Config("this call needs user credentials; none are configured".into())
        })?;
        credentials.check()?;
        Ok(credentials.email())
    }

    pub fn build(&self, request: &ApiRequest) -> Result<HttpRequest> {
        let path = request.path();
        let url = format!("{}{path}", self.config.base_url(request.resource));

        let mut headers = vec![("User-Agent".to_string(), USER_AGENT.to_string())];
        if let Some(key) = self.config.api_key() {
            headers.push((CLIENT_AUTH_HEADER.to_string(), client_auth_value(key)));
        }
        if request.user_auth {
            let credentials = self.config.credentials().ok_or_else(|| {
                OrdrinError::Config(format!(
                    "{} {path} is signed with user credentials; none are configured",
                    request.method
                ))
            })?;
            credentials.check()?;
            headers.push((
                USER_AUTH_HEADER.to_string(),
                user_auth_value(credentials, &path),
            ));
        }

        let body = if request.method.has_body() {
            headers.push((
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ));
            Some(encode_form(&request.form))
        } else {
            None
        };

        Ok(HttpRequest {
            method: request.method,
            url,
            path,
            headers,
            body,
        })
    }

    /// Build, send and decode. Nothing is retried.
    #[instrument(
        skip(self, request),
        fields(resource = %request.resource, method = %request.method)
    )]
    pub fn call(&self, request: &ApiRequest) -> Result<Value> {
        let http = self.build(request)?;
        debug!(url = %http.url, signed = request.user_auth, "dispatching request");
        let response = self.transport.execute(&http)?;
        debug!(status = response.status, "response received");
        parse_response(response).inspect_err(|e| {
            if e.is_remote() {
                warn!(error = %e, "service rejected request");
            }
        })
    }
}

/// Decode the body as JSON and surface service-level failures.
///
/// A JSON object with a truthy `_error` member is a remote error whatever
/// the status; so is any non-2xx status. A 2xx body that is not JSON is a
/// decode error.
pub fn parse_response(response: HttpResponse) -> Result<Value> {
    let status = response.status;
    match serde_json::from_str::<Value>(&response.body) {
        Ok(value) => {
            if let Some(err) = remote_error(status, &value) {
                return Err(err);
            }
            if !response.is_success() {
                return Err(OrdrinError::Remote {
                    status,
                    message: format!("HTTP {status}"),
                    detail: Some(response.body),
                });
            }
            Ok(value)
        }
        Err(e) if response.is_success() => Err(OrdrinError::Decode(e.to_string())),
        Err(_) => Err(OrdrinError::Remote {
            status,
            message: format!("HTTP {status}"),
            detail: Some(response.body).filter(|b| !b.is_empty()),
        }),
    }
}

fn remote_error(status: u16, value: &Value) -> Option<OrdrinError> {
    let raised = match value.get("_error")? {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        _ => false,
    };
    if !raised {
        return None;
    }
    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_owned);
    Some(OrdrinError::Remote {
        status,
        message: text("msg").unwrap_or_else(|| "unspecified error".to_string()),
        detail: text("text"),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::auth::user_auth_hash;
    use crate::config::{Credentials, Servers};

    fn config() -> ClientConfig {
        ClientConfig::new("test-key", Servers::Production)
    }

    fn respond(status: u16, body: &str) -> impl Fn(&HttpRequest) -> Result<HttpResponse> {
        let body = body.to_string();
        move |_: &HttpRequest| {
            Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.clone(),
            })
        }
    }

    fn core() -> ApiCore {
        ApiCore::new(config(), respond(200, "{}"))
    }

    #[test]
    fn segments_are_encoded_independently() {
        let req = ApiRequest::get(
            Resource::Restaurant,
            ["dl", "01-05+18:30", "77840", "College Station", "1 Main St/B"],
        );
        assert_eq!(
            req.path(),
            "/dl/01-05%2B18%3A30/77840/College%20Station/1%20Main%20St%2FB"
        );
    }

    #[test]
    fn unreserved_characters_are_kept() {
        assert_eq!(encode_segment("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(encode_segment("user@example.com"), "user%40example.com");
        assert_eq!(encode_segment("café"), "caf%C3%A9");
    }

    #[test]
    fn form_body_uses_plus_for_spaces() {
        let fields = vec![
            ("first_name".to_string(), "Mary Ann".to_string()),
            ("pw".to_string(), "a&b=c".to_string()),
        ];
        assert_eq!(encode_form(&fields), "first_name=Mary+Ann&pw=a%26b%3Dc");
    }

    #[test]
    fn build_get_has_client_header_and_no_body() {
        let req = core()
            .build(&ApiRequest::get(Resource::Restaurant, ["rd", "141"]))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://r.ordr.in/rd/141");
        assert_eq!(req.path, "/rd/141");
        assert_eq!(req.header(CLIENT_AUTH_HEADER), Some(r#"id="test-key", version="1""#));
        assert_eq!(req.header(USER_AUTH_HEADER), None);
        assert!(req.body.is_none());
    }

    #[test]
    fn build_without_api_key_skips_client_header() {
        let core = ApiCore::new(ClientConfig::new("", Servers::Test), respond(200, "{}"));
        let req = core.build(&ApiRequest::get(Resource::Order, ["x"])).unwrap();
        assert_eq!(req.url, "https://o-test.ordr.in/x");
        assert_eq!(req.header(CLIENT_AUTH_HEADER), None);
    }

    #[test]
    fn build_put_encodes_form_body() {
        let request = ApiRequest::put(Resource::User, ["u", "a@b.co", "password"])
            .with_form(vec![("password".to_string(), "new pass".to_string())])
            .with_user_auth();
        let core = ApiCore::new(
            config().with_credentials(Credentials::new("a@b.co", "old")),
            respond(200, "{}"),
        );
        let req = core.build(&request).unwrap();
        assert_eq!(req.body.as_deref(), Some("password=new+pass"));
        assert_eq!(
            req.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn user_auth_signs_encoded_path() {
        let core = ApiCore::new(
            config().with_credentials(Credentials::new("user@example.com", "secret")),
            respond(200, "{}"),
        );
        let request =
            ApiRequest::get(Resource::User, ["u", "user@example.com", "addrs"]).with_user_auth();
        let req = core.build(&request).unwrap();
        let hash = user_auth_hash("secret", "user@example.com", "/u/user%40example.com/addrs");
        assert_eq!(
            req.header(USER_AUTH_HEADER).unwrap(),
            format!(r#"username="user@example.com", response="{hash}", version="1""#)
        );
    }

    #[test]
    fn user_auth_without_credentials_is_config_error() {
        let request = ApiRequest::get(Resource::User, ["u", "x"]).with_user_auth();
        assert!(matches!(core().build(&request), Err(OrdrinError::Config(_))));
        assert!(core().account_email().is_err());
    }

    #[test]
    fn unusable_account_email_is_config_error_before_sending() {
        let sent = Arc::new(Mutex::new(0));
        let count = Arc::clone(&sent);
        let core = ApiCore::new(
            config().with_credentials(Credentials::new("me\r\n@x.com", "pw")),
            move |_: &HttpRequest| {
                *count.lock().unwrap() += 1;
                Ok(HttpResponse {
                    status: 200,
                    headers: Vec::new(),
                    body: "{}".to_string(),
                })
            },
        );
        assert!(matches!(core.account_email(), Err(OrdrinError::Config(_))));
        let request = ApiRequest::get(Resource::User, ["u", "x"]).with_user_auth();
        assert!(matches!(core.call(&request), Err(OrdrinError::Config(_))));
        assert_eq!(*sent.lock().unwrap(), 0);
    }

    #[test]
    fn call_returns_decoded_json_unchanged() {
        let core = ApiCore::new(config(), respond(200, r#"{"rid":141,"del":1}"#));
        let value = core
            .call(&ApiRequest::get(Resource::Restaurant, ["rd", "141"]))
            .unwrap();
        assert_eq!(value, serde_json::json!({"rid": 141, "del": 1}));
    }

    #[test]
    fn call_passes_built_request_to_transport() {
        let seen: Arc<Mutex<Vec<HttpRequest>>> = Arc::default();
        let log = Arc::clone(&seen);
        let core = ApiCore::new(config(), move |req: &HttpRequest| {
            log.lock().unwrap().push(req.clone());
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: "[]".to_string(),
            })
        });
        core.call(&ApiRequest::delete(Resource::User, ["u", "a"])).unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Delete);
        assert_eq!(seen[0].url, "https://u.ordr.in/u/a");
    }

    #[test]
    fn transport_errors_propagate() {
        let core = ApiCore::new(config(), |_: &HttpRequest| -> Result<HttpResponse> {
            Err(OrdrinError::Transport("connection refused".into()))
        });
        let err = core
            .call(&ApiRequest::get(Resource::Restaurant, ["rd", "1"]))
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn error_payload_becomes_remote_error() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"_error":1,"msg":"Restaurant not found","text":"no restaurant 9"}"#.into(),
        };
        match parse_response(response).unwrap_err() {
            OrdrinError::Remote {
                status,
                message,
                detail,
            } => {
                assert_eq!(status, 200);
                assert_eq!(message, "Restaurant not found");
                assert_eq!(detail.as_deref(), Some("no restaurant 9"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn falsy_error_flag_is_success() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"_error":0,"msg":"ok"}"#.into(),
        };
        assert!(parse_response(response).is_ok());
    }

    #[test]
    fn non_json_bodies() {
        let ok_but_garbage = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "<html>".into(),
        };
        assert!(matches!(parse_response(ok_but_garbage), Err(OrdrinError::Decode(_))));

        let server_error = HttpResponse {
            status: 502,
            headers: Vec::new(),
            body: "bad gateway".into(),
        };
        assert!(matches!(
            parse_response(server_error),
            Err(OrdrinError::Remote { status: 502, .. })
        ));
    }
}
