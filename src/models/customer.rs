//! Customer of the restaurant.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;

use crate::error::CustomerError;
use crate::models::reservation::{Reservation, ReservationSource};
use crate::orm::{BoxFuture, Db, Migration, Model};

/// Column list shared by every customer projection.
pub(crate) const CUSTOMER_COLUMNS: &str = "id, first_name, last_name, phone, notes";

/// Unicode lowercase form of a name, kept alongside it for case-insensitive search.
pub(crate) fn fold_case(name: &str) -> String {
    name.to_lowercase()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// `None` until the first successful save; fixed afterwards.
    #[serde(skip_deserializing)]
    pub(crate) id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl Customer {
    /// A customer that has not been persisted yet.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Customer {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone,
            notes,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    /// First and last name joined by a single space, used verbatim.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// All reservations booked by this customer, in the order the source yields them.
    pub async fn get_reservations(
        &self,
        reservations: &dyn ReservationSource,
    ) -> Result<Vec<Reservation>, CustomerError> {
        let id = self.id.ok_or(CustomerError::Unsaved)?;
        Ok(reservations.reservations_for_customer(id).await?)
    }
}

impl Model for Customer {
    fn table_name() -> &'static str {
        "customers"
    }

    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            phone TEXT,
            notes TEXT,
            first_name_folded TEXT,
            last_name_folded TEXT
        )"
        .to_string()
    }

    fn columns() -> Vec<(String, String)> {
        vec![
            ("id".into(), "INTEGER PRIMARY KEY AUTOINCREMENT".into()),
            ("first_name".into(), "TEXT NOT NULL DEFAULT ''".into()),
            ("last_name".into(), "TEXT NOT NULL DEFAULT ''".into()),
            ("phone".into(), "TEXT".into()),
            ("notes".into(), "TEXT".into()),
            ("first_name_folded".into(), "TEXT".into()),
            ("last_name_folded".into(), "TEXT".into()),
        ]
    }
}

fn migrate_customers(db: Arc<Db>) -> BoxFuture<'static, Result<(), sqlx::Error>> {
    Customer::migrate(db)
}

inventory::submit! {
    Migration(migrate_customers)
}
