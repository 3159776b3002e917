#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use lunchly::orm::{Db, Model};
use lunchly::{Customer, CustomerRepository, Reservation, ReservationRepository};
use std::sync::Arc;

pub struct Fixture {
    pub db: Arc<Db>,
    pub customers: CustomerRepository,
    pub reservations: ReservationRepository,
}

pub async fn setup() -> Fixture {
    let db = Arc::new(Db::connect_in_memory().await.unwrap());
    Customer::migrate(db.clone()).await.unwrap();
    Reservation::migrate(db.clone()).await.unwrap();
    Fixture {
        customers: CustomerRepository::new(db.clone()),
        reservations: ReservationRepository::new(db.clone()),
        db,
    }
}

pub async fn add_customer(fixture: &Fixture, first: &str, last: &str) -> Customer {
    let mut customer = Customer::new(first, last, None, None);
    fixture.customers.save(&mut customer).await.unwrap();
    customer
}

pub async fn book(fixture: &Fixture, customer: &Customer, count: u32) {
    let customer_id = customer.id().unwrap();
    for day in 0..count {
        let mut reservation = Reservation::new(customer_id, 2, at(day + 1, 19), None);
        fixture.reservations.save(&mut reservation).await.unwrap();
    }
}

pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}
