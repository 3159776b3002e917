mod common;

use common::{add_customer, at, setup};
use lunchly::{Customer, CustomerError, Reservation};

#[tokio::test]
async fn test_save_inserts_then_updates_in_place() {
    let fixture = setup().await;

    let mut customer = Customer::new("Ada", "Lovelace", Some("555-0100".into()), None);
    assert!(!customer.is_saved());

    fixture.customers.save(&mut customer).await.unwrap();
    assert!(customer.is_saved());
    let id = customer.id().expect("save assigns an id");
    assert!(id > 0);

    customer.phone = None;
    customer.notes = Some("Prefers the window table".into());
    fixture.customers.save(&mut customer).await.unwrap();
    assert_eq!(customer.id(), Some(id));

    let all = fixture.customers.all().await.unwrap();
    assert_eq!(all.len(), 1);

    let stored = fixture.customers.get(id).await.unwrap();
    assert_eq!(stored, customer);
    assert_eq!(stored.phone, None);
    assert_eq!(stored.notes.as_deref(), Some("Prefers the window table"));
}

#[tokio::test]
async fn test_each_insert_gets_a_fresh_id() {
    let fixture = setup().await;
    let first = add_customer(&fixture, "Amy", "Zephyr").await;
    let second = add_customer(&fixture, "Bob", "Adams").await;
    assert_ne!(first.id(), second.id());
}

#[tokio::test]
async fn test_get_returns_last_saved_values() {
    let fixture = setup().await;
    let mut customer = add_customer(&fixture, "Grace", "Hopper").await;
    let id = customer.id().unwrap();

    let mut other_copy = fixture.customers.get(id).await.unwrap();
    other_copy.first_name = "Admiral".into();
    fixture.customers.save(&mut other_copy).await.unwrap();

    customer.last_name = "Murray".into();
    fixture.customers.save(&mut customer).await.unwrap();

    let stored = fixture.customers.get(id).await.unwrap();
    assert_eq!(stored.first_name, "Grace");
    assert_eq!(stored.last_name, "Murray");
}

#[tokio::test]
async fn test_get_missing_customer_is_not_found() {
    let fixture = setup().await;
    let err = fixture.customers.get(4242).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), 404);
    assert!(matches!(err, CustomerError::NotFound { id: 4242 }));
    assert_eq!(err.to_string(), "No such customer: 4242");
}

#[tokio::test]
async fn test_all_orders_by_last_then_first_name() {
    let fixture = setup().await;
    add_customer(&fixture, "Amy", "Zephyr").await;
    add_customer(&fixture, "Bob", "Adams").await;
    add_customer(&fixture, "Al", "Adams").await;

    let names: Vec<String> = fixture
        .customers
        .all()
        .await
        .unwrap()
        .iter()
        .map(Customer::full_name)
        .collect();
    assert_eq!(names, vec!["Al Adams", "Bob Adams", "Amy Zephyr"]);
}

#[tokio::test]
async fn test_all_on_empty_table() {
    let fixture = setup().await;
    assert!(fixture.customers.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_storage_failure_propagates() {
    let fixture = setup().await;
    fixture.db.execute("DROP TABLE reservations").await.unwrap();
    fixture.db.execute("DROP TABLE customers").await.unwrap();

    let err = fixture.customers.get(1).await.unwrap_err();
    assert!(matches!(err, CustomerError::Storage(_)));
    assert_eq!(err.status(), 500);

    let mut customer = Customer::new("Ada", "Lovelace", None, None);
    let err = fixture.customers.save(&mut customer).await.unwrap_err();
    assert!(matches!(err, CustomerError::Storage(_)));
    assert_eq!(customer.id(), None);
}

#[test]
fn test_full_name() {
    let customer = Customer::new("Ada", "Lovelace", None, None);
    assert_eq!(customer.full_name(), "Ada Lovelace");

    let partial = Customer::new("", "Cher", None, None);
    assert_eq!(partial.full_name(), " Cher");
}

#[test]
fn test_customer_serializes_with_camel_case_names() {
    let customer = Customer::new("Ada", "Lovelace", None, Some("VIP".into()));
    let json = serde_json::to_value(&customer).unwrap();
    assert_eq!(json["firstName"], "Ada");
    assert_eq!(json["lastName"], "Lovelace");
    assert_eq!(json["notes"], "VIP");
    assert!(json["id"].is_null());
}

#[tokio::test]
async fn test_deserialized_customer_is_unsaved_and_gets_inserted() {
    let fixture = setup().await;
    let existing = add_customer(&fixture, "Ada", "Lovelace").await;

    let mut customer: Customer = serde_json::from_str(&format!(
        r#"{{"id": {}, "firstName": "Ghost", "lastName": "Writer", "phone": null, "notes": "from a form"}}"#,
        existing.id().unwrap()
    ))
    .unwrap();
    assert_eq!(customer.id(), None);
    assert!(!customer.is_saved());

    fixture.customers.save(&mut customer).await.unwrap();
    let id = customer.id().unwrap();
    assert_ne!(Some(id), existing.id());

    assert_eq!(fixture.customers.get(id).await.unwrap().full_name(), "Ghost Writer");
    assert_eq!(
        fixture.customers.get(existing.id().unwrap()).await.unwrap(),
        existing
    );
}

#[test]
fn test_deserialized_reservation_has_no_id() {
    let reservation: Reservation = serde_json::from_str(
        r#"{"id": 9, "customerId": 1, "numGuests": 2, "startAt": "2024-03-01T19:00:00", "notes": null}"#,
    )
    .unwrap();
    assert_eq!(reservation.id(), None);
    assert_eq!(reservation.start_at, at(1, 19));
}

#[tokio::test]
async fn test_reservations_of_unsaved_customer_fail() {
    let fixture = setup().await;
    let customer = Customer::new("Ada", "Lovelace", None, None);
    let err = customer
        .get_reservations(&fixture.reservations)
        .await
        .unwrap_err();
    assert!(matches!(err, CustomerError::Unsaved));
    assert_eq!(err.status(), 400);
}

#[tokio::test]
async fn test_reservations_of_saved_customer() {
    let fixture = setup().await;
    let ada = add_customer(&fixture, "Ada", "Lovelace").await;
    let bob = add_customer(&fixture, "Bob", "Adams").await;

    let mut later = Reservation::new(ada.id().unwrap(), 4, at(12, 20), None);
    let mut earlier = Reservation::new(ada.id().unwrap(), 2, at(3, 18), Some("Birthday".into()));
    let mut other = Reservation::new(bob.id().unwrap(), 1, at(5, 12), None);
    fixture.reservations.save(&mut later).await.unwrap();
    fixture.reservations.save(&mut earlier).await.unwrap();
    fixture.reservations.save(&mut other).await.unwrap();

    earlier.num_guests = 3;
    fixture.reservations.save(&mut earlier).await.unwrap();

    let booked = ada.get_reservations(&fixture.reservations).await.unwrap();
    assert_eq!(booked, vec![earlier, later]);
    assert_eq!(booked[0].num_guests, 3);

    let none = add_customer(&fixture, "Cy", "Nobody").await;
    assert!(none
        .get_reservations(&fixture.reservations)
        .await
        .unwrap()
        .is_empty());
}
