//! Reservations booked by customers.
//!
//! The customer core only needs `ReservationSource`; the sqlite-backed
//! `ReservationRepository` is what the application wires in.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::warn;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;

use crate::orm::{BoxFuture, Db, Migration, Model, Param};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(skip_deserializing)]
    pub(crate) id: Option<i64>,
    pub customer_id: i64,
    pub num_guests: i64,
    pub start_at: NaiveDateTime,
    pub notes: Option<String>,
}

impl Reservation {
    pub fn new(
        customer_id: i64,
        num_guests: i64,
        start_at: NaiveDateTime,
        notes: Option<String>,
    ) -> Self {
        Reservation {
            id: None,
            customer_id,
            num_guests,
            start_at,
            notes,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }
}

/// Anything able to list the reservations of one customer.
#[async_trait]
pub trait ReservationSource: Send + Sync {
    async fn reservations_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<Reservation>, sqlx::Error>;
}

#[derive(Clone)]
pub struct ReservationRepository {
    db: Arc<Db>,
}

impl ReservationRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Insert when unsaved (writing the new id back), update otherwise.
    pub async fn save(&self, reservation: &mut Reservation) -> Result<(), sqlx::Error> {
        let values = [
            Param::Int(reservation.customer_id),
            Param::Int(reservation.num_guests),
            Param::Timestamp(reservation.start_at),
            Param::from(reservation.notes.clone()),
        ];

        match reservation.id {
            None => {
                let (id,): (i64,) = self
                    .db
                    .fetch_one_with(
                        "INSERT INTO reservations (customer_id, num_guests, start_at, notes)
                         VALUES (?, ?, ?, ?)
                         RETURNING id",
                        &values,
                    )
                    .await?;
                reservation.id = Some(id);
            }
            Some(id) => {
                let mut params = values.to_vec();
                params.push(Param::Int(id));
                let touched = self
                    .db
                    .execute_with(
                        "UPDATE reservations
                         SET customer_id = ?, num_guests = ?, start_at = ?, notes = ?
                         WHERE id = ?",
                        &params,
                    )
                    .await?;
                if touched == 0 {
                    warn!("Update of reservation {} matched no row", id);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationSource for ReservationRepository {
    async fn reservations_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        self.db
            .fetch_all_with(
                "SELECT id, customer_id, num_guests, start_at, notes
                 FROM reservations
                 WHERE customer_id = ?
                 ORDER BY start_at",
                &[Param::Int(customer_id)],
            )
            .await
    }
}

impl Model for Reservation {
    fn table_name() -> &'static str {
        "reservations"
    }

    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS reservations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL REFERENCES customers(id),
            num_guests INTEGER NOT NULL,
            start_at DATETIME NOT NULL,
            notes TEXT
        )"
        .to_string()
    }

    fn columns() -> Vec<(String, String)> {
        vec![
            ("id".into(), "INTEGER PRIMARY KEY AUTOINCREMENT".into()),
            ("customer_id".into(), "INTEGER REFERENCES customers(id)".into()),
            ("num_guests".into(), "INTEGER NOT NULL DEFAULT 1".into()),
            ("start_at".into(), "DATETIME".into()),
            ("notes".into(), "TEXT".into()),
        ]
    }
}

fn migrate_reservations(db: Arc<Db>) -> BoxFuture<'static, Result<(), sqlx::Error>> {
    Reservation::migrate(db)
}

inventory::submit! {
    Migration(migrate_reservations)
}
