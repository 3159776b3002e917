use serde::Serialize;
use sqlx::FromRow;

use crate::error::CustomerError;
use crate::models::customer::Customer;
use crate::orm::Param;
use crate::repository::CustomerRepository;

pub const TOP_CUSTOMER_LIMIT: i64 = 10;

/// A customer together with how many reservations they have booked.
#[derive(Clone, Debug, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopCustomer {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub customer: Customer,
    #[sqlx(rename = "count")]
    pub reservation_count: i64,
}

impl CustomerRepository {
    /// The ten customers with the most reservations, busiest first.
    /// Customers without any reservation never appear.
    pub async fn top_ten(&self) -> Result<Vec<TopCustomer>, CustomerError> {
        let ranked = self
            .db
            .fetch_all_with(
                "SELECT c.id AS id,
                        c.first_name AS first_name,
                        c.last_name AS last_name,
                        c.phone AS phone,
                        c.notes AS notes,
                        COUNT(*) AS count
                 FROM reservations AS r
                 JOIN customers AS c ON c.id = r.customer_id
                 GROUP BY c.id
                 ORDER BY count DESC
                 LIMIT ?",
                &[Param::Int(TOP_CUSTOMER_LIMIT)],
            )
            .await?;
        Ok(ranked)
    }
}
