//! End-to-end flows against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and points all three service
//! hosts at it, then drives every façade over real HTTP through the bundled
//! ureq transport. Covers request signing, form encoding and the mapping of
//! service errors onto `OrdrinError`.

use std::net::SocketAddr;

use ordrin_core::{
    Address, ClientConfig, CreditCard, Credentials, DeliveryTime, OrderAccount, OrderSubmission,
    Ordrin, OrdrinError, Servers, Tray, TrayItem,
};

fn start_mock_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

fn config(addr: SocketAddr) -> ClientConfig {
    let base = format!("http://{addr}");
    ClientConfig::new("test-key", Servers::custom(&base, &base, &base).unwrap())
}

fn home() -> Address {
    Address::new("1 Main St", "College Station", "TX", "77840", "5555555555")
}

fn card() -> CreditCard {
    CreditCard::new("Jane Doe", 12, 2099, home(), "4111111111111111", "123")
}

fn submission(account: OrderAccount) -> OrderSubmission {
    OrderSubmission {
        restaurant_id: "141".to_string(),
        tray: Tray::new(vec![TrayItem::new(3270, 2).with_options([3263])]),
        tip: "3.50".to_string(),
        delivery: "2030-01-05 18:30".parse().unwrap(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        address: home(),
        card: card(),
        account,
    }
}

#[test]
fn restaurant_flow() {
    let addr = start_mock_server();
    let client = Ordrin::new(config(addr));
    let restaurant = client.restaurant();

    let list = restaurant.delivery_list(&DeliveryTime::Asap, &home()).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 2);

    let later: DeliveryTime = "2030-01-05 18:30".parse().unwrap();
    let check = restaurant.delivery_check("141", &later, &home()).unwrap();
    assert_eq!(check["del"], 1);

    let fee = restaurant
        .delivery_fee("141", "20.00", "", &DeliveryTime::Asap, &home())
        .unwrap();
    assert_eq!(fee["total"], "24.65");

    let details = restaurant.details("141").unwrap();
    assert_eq!(details["name"], "Aggie Grill");
}

#[test]
fn service_errors_surface_as_remote() {
    let addr = start_mock_server();
    let client = Ordrin::new(config(addr));

    match client.restaurant().details("999").unwrap_err() {
        OrdrinError::Remote { status, message, detail } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not found");
            assert_eq!(detail.as_deref(), Some("no restaurant 999"));
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[test]
fn missing_api_key_is_rejected_by_service() {
    let addr = start_mock_server();
    let base = format!("http://{addr}");
    let client = Ordrin::new(ClientConfig::new(
        "",
        Servers::custom(&base, &base, &base).unwrap(),
    ));

    let err = client.restaurant().details("141").unwrap_err();
    assert!(err.is_remote());
}

#[test]
fn invalid_input_never_reaches_the_service() {
    // Port 9 is closed; any request would fail with a transport error.
    let client = Ordrin::new(ClientConfig::new(
        "test-key",
        Servers::custom("http://127.0.0.1:9", "http://127.0.0.1:9", "http://127.0.0.1:9")
            .unwrap(),
    ));
    let err = client
        .restaurant()
        .delivery_fee("abc", "1.5", "x", &DeliveryTime::Asap, &home())
        .unwrap_err();
    assert!(err.is_bad_value());
    assert_eq!(err.messages().len(), 3);

    let err = client.restaurant().details("141").unwrap_err();
    assert!(err.is_transport());
}

#[test]
fn user_account_lifecycle() {
    let addr = start_mock_server();
    let email = "jane+orders@example.com";
    let signed = Ordrin::new(config(addr).with_credentials(Credentials::new(email, "hunter2")));
    let user = signed.user();

    let created = user.create(email, "hunter2", "Jane", "Doe").unwrap();
    assert_eq!(created["user"], email);

    let info = user.account_info().unwrap();
    assert_eq!(info["em"], email);
    assert_eq!(info["last_name"], "Doe");

    user.set_address("home", &home().with_street2("Apt 4")).unwrap();
    let saved = user.address("home").unwrap();
    assert_eq!(saved["addr2"], "Apt 4");
    assert!(user.addresses().unwrap().get("home").is_some());
    user.delete_address("home").unwrap();
    assert!(user.address("home").unwrap_err().is_remote());

    user.set_card("visa", &card()).unwrap();
    let stored = user.card("visa").unwrap();
    assert_eq!(stored["last4"], "1111");
    assert_eq!(stored["expiry_month"], "12");
    assert!(user.cards().unwrap().get("visa").is_some());
    user.delete_card("visa").unwrap();
    assert!(user.cards().unwrap().as_object().unwrap().is_empty());
}

#[test]
fn wrong_password_is_rejected() {
    let addr = start_mock_server();
    let email = "sam@example.com";
    let good = Ordrin::new(config(addr).with_credentials(Credentials::new(email, "right")));
    good.user().create(email, "right", "Sam", "Smith").unwrap();

    let bad = Ordrin::new(config(addr).with_credentials(Credentials::new(email, "wrong")));
    match bad.user().account_info().unwrap_err() {
        OrdrinError::Remote { status, .. } => assert_eq!(status, 401),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[test]
fn password_update_requires_new_client() {
    let addr = start_mock_server();
    let email = "pat@example.com";
    let old = Ordrin::new(config(addr).with_credentials(Credentials::new(email, "old-pw")));
    old.user().create(email, "old-pw", "Pat", "Lee").unwrap();

    old.user().update_password("new-pw").unwrap();
    assert!(old.user().account_info().unwrap_err().is_remote());

    let new = Ordrin::new(config(addr).with_credentials(Credentials::new(email, "new-pw")));
    assert_eq!(new.user().account_info().unwrap()["first_name"], "Pat");
}

#[test]
fn guest_order_is_accepted() {
    let addr = start_mock_server();
    let client = Ordrin::new(config(addr));

    let receipt = client
        .order()
        .submit(&submission(OrderAccount::Guest {
            email: "guest@example.com".to_string(),
        }))
        .unwrap();
    assert_eq!(receipt["msg"], "Order accepted");
    assert!(receipt["refnum"].is_string());
}

#[test]
fn signed_order_appears_in_history() {
    let addr = start_mock_server();
    let email = "kim@example.com";
    let client = Ordrin::new(config(addr).with_credentials(Credentials::new(email, "pw")));
    client.user().create(email, "pw", "Kim", "Park").unwrap();

    let receipt = client.order().submit(&submission(OrderAccount::User)).unwrap();
    let refnum = receipt["refnum"].as_str().unwrap();

    let history = client.user().order_history().unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);

    let order = client.user().order(refnum).unwrap();
    assert_eq!(order["tray"], "3270/2,3263");
    assert_eq!(order["delivery_date"], "01-05");
}

#[test]
fn order_outside_delivery_area_is_refused() {
    let addr = start_mock_server();
    let client = Ordrin::new(config(addr));
    let mut order = submission(OrderAccount::Guest {
        email: "guest@example.com".to_string(),
    });
    order.address.zip = "10001".to_string();

    let err = client.order().submit(&order).unwrap_err();
    assert!(err.is_remote());
}
