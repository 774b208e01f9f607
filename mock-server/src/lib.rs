//! In-memory stand-in for the Ordr.in restaurant, user and order services.
//!
//! All three services are served from one router so tests can point every
//! base URL at the same listener. Errors use the service's JSON envelope
//! `{"_error": 1, "msg": ..., "text": ...}`.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const CLIENT_AUTH_HEADER: &str = "x-naama-client-authentication";
pub const USER_AUTH_HEADER: &str = "x-naama-authentication";

/// Error returned by every handler, rendered in the service's envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    msg: String,
    text: String,
}

impl ApiError {
    fn new(status: StatusCode, msg: &str, text: impl Into<String>) -> Self {
        Self {
            status,
            msg: msg.to_string(),
            text: text.into(),
        }
    }

    fn not_found(text: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not found", text)
    }

    fn unauthorized(text: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication failed", text)
    }

    fn bad_request(text: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid request", text)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "_error": 1, "msg": self.msg, "text": self.text });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

#[derive(Debug, Default)]
struct Account {
    password: String,
    first_name: String,
    last_name: String,
    addresses: BTreeMap<String, BTreeMap<String, String>>,
    cards: BTreeMap<String, BTreeMap<String, String>>,
    orders: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
}

pub type Db = Arc<RwLock<Store>>;

struct Listing {
    id: u64,
    name: &'static str,
    cuisine: &'static str,
    /// Zip prefixes served; empty means everywhere.
    zip_prefixes: &'static [&'static str],
}

const RESTAURANTS: &[Listing] = &[
    Listing {
        id: 141,
        name: "Aggie Grill",
        cuisine: "American",
        zip_prefixes: &["778"],
    },
    Listing {
        id: 142,
        name: "Night Owl Pizza",
        cuisine: "Pizza",
        zip_prefixes: &[],
    },
];

impl Listing {
    fn delivers_to(&self, zip: &str) -> bool {
        self.zip_prefixes.is_empty() || self.zip_prefixes.iter().any(|p| zip.starts_with(p))
    }

    fn summary(&self) -> Value {
        json!({ "id": self.id, "na": self.name, "cu": [self.cuisine] })
    }
}

fn listing(rid: &str) -> Result<&'static Listing, ApiError> {
    RESTAURANTS
        .iter()
        .find(|r| r.id.to_string() == rid)
        .ok_or_else(|| ApiError::not_found(format!("no restaurant {rid}")))
}

pub fn app() -> Router {
    let db: Db = Arc::default();
    Router::new()
        .route("/dl/{dt}/{zip}/{city}/{street}", get(delivery_list))
        .route("/dc/{rid}/{dt}/{zip}/{city}/{street}", get(delivery_check))
        .route(
            "/fee/{rid}/{subtotal}/{tip}/{dt}/{zip}/{city}/{street}",
            get(delivery_fee),
        )
        .route("/rd/{rid}", get(details))
        .route("/u/{email}", get(account_info).post(create_user))
        .route("/u/{email}/addrs", get(list_addresses))
        .route(
            "/u/{email}/addrs/{nick}",
            get(get_address).put(set_address).delete(delete_address),
        )
        .route("/u/{email}/ccs", get(list_cards))
        .route(
            "/u/{email}/ccs/{nick}",
            get(get_card).put(set_card).delete(delete_card),
        )
        .route("/u/{email}/orders", get(order_history))
        .route("/u/{email}/order/{oid}", get(get_order))
        .route("/u/{email}/password", put(update_password))
        .route("/o/{rid}", post(submit_order))
        .layer(middleware::from_fn(require_client_key))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock Ordr.in listening");
    }
    axum::serve(listener, app()).await
}

/// `key="value", key="value"` pairs of the authentication headers.
fn header_params(value: &str) -> HashMap<&str, &str> {
    value
        .split(',')
        .filter_map(|part| part.trim().split_once('='))
        .map(|(k, v)| (k.trim(), v.trim().trim_matches('"')))
        .collect()
}

async fn require_client_key(request: Request, next: Next) -> Result<Response, ApiError> {
    let identified = request
        .headers()
        .get(CLIENT_AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| header_params(v).get("id").is_some_and(|id| !id.is_empty()));
    if !identified {
        return Err(ApiError::unauthorized("missing client authentication"));
    }
    Ok(next.run(request).await)
}

/// Hex SHA-256 of `password ‖ email ‖ path`.
pub fn expected_response(password: &str, email: &str, path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(email.as_bytes());
    hasher.update(path.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check the user signature and return the signed-in account.
fn authenticate<'s>(
    store: &'s Store,
    headers: &HeaderMap,
    uri: &Uri,
    email: &str,
) -> Result<&'s Account, ApiError> {
    let header = headers
        .get(USER_AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing user authentication"))?;
    let params = header_params(header);
    if params.get("username").copied() != Some(email) {
        return Err(ApiError::unauthorized("username does not match account"));
    }
    let account = store
        .accounts
        .get(email)
        .ok_or_else(|| ApiError::unauthorized(format!("no account {email}")))?;
    let expected = expected_response(&account.password, email, uri.path());
    if params.get("response").copied() != Some(expected.as_str()) {
        debug!(path = uri.path(), "signature mismatch");
        return Err(ApiError::unauthorized("bad signature"));
    }
    Ok(account)
}

fn authenticate_mut<'s>(
    store: &'s mut Store,
    headers: &HeaderMap,
    uri: &Uri,
    email: &str,
) -> Result<&'s mut Account, ApiError> {
    authenticate(store, headers, uri, email)?;
    store
        .accounts
        .get_mut(email)
        .ok_or_else(|| ApiError::unauthorized(format!("no account {email}")))
}

fn valid_delivery_time(dt: &str) -> bool {
    if dt == "ASAP" {
        return true;
    }
    let b = dt.as_bytes();
    b.len() == 11
        && b[2] == b'-'
        && b[5] == b'+'
        && b[8] == b':'
        && [0, 1, 3, 4, 6, 7, 9, 10].iter().all(|&i| b[i].is_ascii_digit())
}

fn check_delivery_time(dt: &str) -> Result<(), ApiError> {
    if valid_delivery_time(dt) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("bad delivery time {dt}")))
    }
}

fn require_fields(fields: &BTreeMap<String, String>, names: &[&str]) -> Result<(), ApiError> {
    match names.iter().find(|n| fields.get(**n).is_none_or(|v| v.is_empty())) {
        Some(missing) => Err(ApiError::bad_request(format!("missing field {missing}"))),
        None => Ok(()),
    }
}

// --- restaurant ---

async fn delivery_list(
    Path((dt, zip, _city, _street)): Path<(String, String, String, String)>,
) -> ApiResult {
    check_delivery_time(&dt)?;
    let open: Vec<Value> = RESTAURANTS
        .iter()
        .filter(|r| r.delivers_to(&zip))
        .map(Listing::summary)
        .collect();
    Ok(Json(Value::Array(open)))
}

async fn delivery_check(
    Path((rid, dt, zip, _city, _street)): Path<(String, String, String, String, String)>,
) -> ApiResult {
    check_delivery_time(&dt)?;
    let restaurant = listing(&rid)?;
    let delivers = restaurant.delivers_to(&zip);
    Ok(Json(json!({
        "rid": restaurant.id,
        "del": u8::from(delivers),
        "msg": if delivers { "Delivers" } else { "Outside delivery area" },
    })))
}

#[allow(clippy::type_complexity)]
async fn delivery_fee(
    Path((rid, subtotal, tip, dt, zip, _city, _street)): Path<(
        String,
        String,
        String,
        String,
        String,
        String,
        String,
    )>,
) -> ApiResult {
    check_delivery_time(&dt)?;
    let restaurant = listing(&rid)?;
    let subtotal: f64 = subtotal
        .parse()
        .map_err(|_| ApiError::bad_request(format!("bad subtotal {subtotal}")))?;
    let tip: f64 = tip
        .parse()
        .map_err(|_| ApiError::bad_request(format!("bad tip {tip}")))?;
    let fee = 3.0;
    let tax = subtotal * 0.0825;
    Ok(Json(json!({
        "rid": restaurant.id,
        "del": u8::from(restaurant.delivers_to(&zip)),
        "fee": format!("{fee:.2}"),
        "tax": format!("{tax:.2}"),
        "total": format!("{:.2}", subtotal + tip + fee + tax),
    })))
}

async fn details(Path(rid): Path<String>) -> ApiResult {
    let restaurant = listing(&rid)?;
    Ok(Json(json!({
        "restaurant_id": restaurant.id,
        "name": restaurant.name,
        "cuisine": [restaurant.cuisine],
        "menu": [{
            "id": 3270,
            "name": "House Burger",
            "price": "8.50",
            "children": [{ "id": 3263, "name": "Add cheese", "price": "0.75" }],
        }],
    })))
}

// --- user ---

#[derive(Deserialize)]
pub struct CreateUser {
    pub pw: String,
    pub first_name: String,
    pub last_name: String,
}

async fn create_user(
    State(db): State<Db>,
    Path(email): Path<String>,
    Form(input): Form<CreateUser>,
) -> ApiResult {
    let mut store = db.write().await;
    if store.accounts.contains_key(&email) {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "Account exists",
            format!("{email} is already registered"),
        ));
    }
    store.accounts.insert(
        email.clone(),
        Account {
            password: input.pw,
            first_name: input.first_name,
            last_name: input.last_name,
            ..Account::default()
        },
    );
    Ok(Json(json!({ "msg": "User created", "user": email })))
}

async fn account_info(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path(email): Path<String>,
) -> ApiResult {
    let store = db.read().await;
    let account = authenticate(&store, &headers, &uri, &email)?;
    Ok(Json(json!({
        "em": email,
        "first_name": account.first_name,
        "last_name": account.last_name,
    })))
}

async fn list_addresses(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path(email): Path<String>,
) -> ApiResult {
    let store = db.read().await;
    let account = authenticate(&store, &headers, &uri, &email)?;
    Ok(Json(json!(account.addresses)))
}

async fn get_address(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path((email, nick)): Path<(String, String)>,
) -> ApiResult {
    let store = db.read().await;
    let account = authenticate(&store, &headers, &uri, &email)?;
    account
        .addresses
        .get(&nick)
        .map(|a| Json(json!(a)))
        .ok_or_else(|| ApiError::not_found(format!("no address {nick}")))
}

async fn set_address(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path((email, nick)): Path<(String, String)>,
    Form(fields): Form<BTreeMap<String, String>>,
) -> ApiResult {
    require_fields(&fields, &["addr", "city", "state", "zip", "phone"])?;
    let mut store = db.write().await;
    let account = authenticate_mut(&mut store, &headers, &uri, &email)?;
    account.addresses.insert(nick.clone(), fields);
    Ok(Json(json!({ "msg": "Address saved", "nick": nick })))
}

async fn delete_address(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path((email, nick)): Path<(String, String)>,
) -> ApiResult {
    let mut store = db.write().await;
    let account = authenticate_mut(&mut store, &headers, &uri, &email)?;
    account
        .addresses
        .remove(&nick)
        .map(|_| Json(json!({ "msg": "Address deleted", "nick": nick.clone() })))
        .ok_or_else(|| ApiError::not_found(format!("no address {nick}")))
}

async fn list_cards(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path(email): Path<String>,
) -> ApiResult {
    let store = db.read().await;
    let account = authenticate(&store, &headers, &uri, &email)?;
    Ok(Json(json!(account.cards)))
}

async fn get_card(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path((email, nick)): Path<(String, String)>,
) -> ApiResult {
    let store = db.read().await;
    let account = authenticate(&store, &headers, &uri, &email)?;
    account
        .cards
        .get(&nick)
        .map(|c| Json(json!(c)))
        .ok_or_else(|| ApiError::not_found(format!("no card {nick}")))
}

async fn set_card(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path((email, nick)): Path<(String, String)>,
    Form(mut fields): Form<BTreeMap<String, String>>,
) -> ApiResult {
    require_fields(
        &fields,
        &["name", "number", "cvc", "expiry_month", "expiry_year", "bill_addr", "bill_zip"],
    )?;
    let mut store = db.write().await;
    let account = authenticate_mut(&mut store, &headers, &uri, &email)?;
    fields.remove("cvc");
    if let Some(number) = fields.remove("number") {
        let tail = number.len().saturating_sub(4);
        fields.insert("last4".to_string(), number.get(tail..).unwrap_or_default().to_string());
    }
    account.cards.insert(nick.clone(), fields);
    Ok(Json(json!({ "msg": "Card saved", "nick": nick })))
}

async fn delete_card(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path((email, nick)): Path<(String, String)>,
) -> ApiResult {
    let mut store = db.write().await;
    let account = authenticate_mut(&mut store, &headers, &uri, &email)?;
    account
        .cards
        .remove(&nick)
        .map(|_| Json(json!({ "msg": "Card deleted", "nick": nick.clone() })))
        .ok_or_else(|| ApiError::not_found(format!("no card {nick}")))
}

async fn order_history(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path(email): Path<String>,
) -> ApiResult {
    let store = db.read().await;
    let account = authenticate(&store, &headers, &uri, &email)?;
    Ok(Json(Value::Array(account.orders.clone())))
}

async fn get_order(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path((email, oid)): Path<(String, String)>,
) -> ApiResult {
    let store = db.read().await;
    let account = authenticate(&store, &headers, &uri, &email)?;
    account
        .orders
        .iter()
        .find(|o| o["oid"] == oid.as_str())
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no order {oid}")))
}

#[derive(Deserialize)]
pub struct UpdatePassword {
    pub password: String,
}

async fn update_password(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path(email): Path<String>,
    Form(input): Form<UpdatePassword>,
) -> ApiResult {
    if input.password.is_empty() {
        return Err(ApiError::bad_request("password cannot be empty"));
    }
    let mut store = db.write().await;
    let account = authenticate_mut(&mut store, &headers, &uri, &email)?;
    account.password = input.password;
    Ok(Json(json!({ "msg": "Password updated" })))
}

// --- order ---

const ORDER_FIELDS: &[&str] = &[
    "tray",
    "tip",
    "delivery_date",
    "first_name",
    "last_name",
    "addr",
    "city",
    "state",
    "zip",
    "phone",
    "em",
    "card_name",
    "card_number",
    "card_cvc",
    "card_expiry",
];

async fn submit_order(
    State(db): State<Db>,
    headers: HeaderMap,
    uri: Uri,
    Path(rid): Path<String>,
    Form(fields): Form<BTreeMap<String, String>>,
) -> ApiResult {
    let restaurant = listing(&rid)?;
    require_fields(&fields, ORDER_FIELDS)?;
    if !restaurant.delivers_to(&fields["zip"]) {
        return Err(ApiError::bad_request("restaurant does not deliver there"));
    }

    let oid = Uuid::new_v4().simple().to_string();
    let record = json!({
        "oid": oid,
        "rid": restaurant.id,
        "tray": fields["tray"],
        "tip": fields["tip"],
        "delivery_date": fields["delivery_date"],
    });

    if headers.contains_key(USER_AUTH_HEADER) {
        let mut store = db.write().await;
        let account = authenticate_mut(&mut store, &headers, &uri, &fields["em"])?;
        account.orders.push(record);
    }
    Ok(Json(json!({ "msg": "Order accepted", "refnum": oid })))
}
