//! Customer persistence: listing, lookup by id and save.

use log::{debug, warn};
use std::sync::Arc;

use crate::error::CustomerError;
use crate::models::customer::{CUSTOMER_COLUMNS, Customer, fold_case};
use crate::orm::{Db, Param};

/// Reads and writes customers through a shared storage gateway.
///
/// Name search (`find`) and the patron ranking (`top_ten`) are implemented
/// in their own modules on this same type.
#[derive(Clone)]
pub struct CustomerRepository {
    pub(crate) db: Arc<Db>,
}

impl CustomerRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Every customer, ordered by last name then first name.
    pub async fn all(&self) -> Result<Vec<Customer>, CustomerError> {
        let customers = self
            .db
            .fetch_all(&format!(
                "SELECT {CUSTOMER_COLUMNS}
                 FROM customers
                 ORDER BY last_name, first_name"
            ))
            .await?;
        Ok(customers)
    }

    /// The customer with the given id, or `CustomerError::NotFound`.
    pub async fn get(&self, id: i64) -> Result<Customer, CustomerError> {
        self.db
            .fetch_optional_with(
                &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?"),
                &[Param::Int(id)],
            )
            .await?
            .ok_or(CustomerError::NotFound { id })
    }

    /// Persist `customer`. An unsaved customer is inserted and receives its
    /// generated id; a saved one has its four mutable fields overwritten.
    pub async fn save(&self, customer: &mut Customer) -> Result<(), CustomerError> {
        let values = [
            Param::from(customer.first_name.as_str()),
            Param::from(customer.last_name.as_str()),
            Param::from(customer.phone.clone()),
            Param::from(customer.notes.clone()),
            Param::from(fold_case(&customer.first_name)),
            Param::from(fold_case(&customer.last_name)),
        ];

        match customer.id {
            None => {
                let (id,): (i64,) = self
                    .db
                    .fetch_one_with(
                        "INSERT INTO customers
                             (first_name, last_name, phone, notes, first_name_folded, last_name_folded)
                         VALUES (?, ?, ?, ?, ?, ?)
                         RETURNING id",
                        &values,
                    )
                    .await?;
                debug!("Inserted customer {}", id);
                customer.id = Some(id);
            }
            Some(id) => {
                let mut params = values.to_vec();
                params.push(Param::Int(id));
                let touched = self
                    .db
                    .execute_with(
                        "UPDATE customers
                         SET first_name = ?, last_name = ?, phone = ?, notes = ?,
                             first_name_folded = ?, last_name_folded = ?
                         WHERE id = ?",
                        &params,
                    )
                    .await?;
                if touched == 0 {
                    warn!("Update of customer {} matched no row", id);
                }
            }
        }
        Ok(())
    }
}
