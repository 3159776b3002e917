//! Free-text customer name search.
//!
//! A query matches a customer when either name column contains the whole
//! query, or when the first name contains the query's first word and the
//! last name contains its last word. "Jane Doe" therefore finds Jane Doe even
//! though neither column holds "Jane Doe". Middle names and multi-word
//! surnames are not treated specially.

use log::debug;

use crate::error::CustomerError;
use crate::models::customer::{CUSTOMER_COLUMNS, Customer, fold_case};
use crate::orm::Param;
use crate::repository::CustomerRepository;

/// A search query split into the pieces the match is built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameQuery {
    pub whole: String,
    pub first_token: String,
    pub last_token: String,
}

impl NameQuery {
    pub fn parse(query: &str) -> Self {
        let tokens: Vec<&str> = query.split_whitespace().collect();
        let first_token = tokens.first().copied().unwrap_or_default();
        let last_token = tokens.last().copied().unwrap_or_default();
        NameQuery {
            whole: query.to_string(),
            first_token: first_token.to_string(),
            last_token: last_token.to_string(),
        }
    }

    /// Lowercased LIKE patterns for (whole query, first token, last token).
    pub fn patterns(&self) -> [String; 3] {
        [
            contains_pattern(&fold_case(&self.whole)),
            contains_pattern(&fold_case(&self.first_token)),
            contains_pattern(&fold_case(&self.last_token)),
        ]
    }
}

/// `%term%` with LIKE wildcards in `term` escaped by `\`.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

const FIRST: &str = "coalesce(first_name_folded, lower(first_name))";
const LAST: &str = "coalesce(last_name_folded, lower(last_name))";

impl CustomerRepository {
    /// Customers whose first or last name matches `query`, in storage order.
    ///
    /// No match is an empty vector; a query that fails to run is
    /// `CustomerError::Storage`.
    pub async fn find(&self, query: &str) -> Result<Vec<Customer>, CustomerError> {
        let name = NameQuery::parse(query);
        debug!(
            "Searching customers for {:?} (first {:?}, last {:?})",
            name.whole, name.first_token, name.last_token
        );
        let [whole, first, last] = name.patterns();

        // Names are matched through their stored lowercase copies; rows written
        // without them fall back to sqlite's ASCII-only lower().
        let customers = self
            .db
            .fetch_all_with(
                &format!(
                    "SELECT {CUSTOMER_COLUMNS}
                     FROM customers
                     WHERE {FIRST} LIKE ?1 ESCAPE '\\'
                        OR {LAST} LIKE ?1 ESCAPE '\\'
                        OR ({FIRST} LIKE ?2 ESCAPE '\\' AND {LAST} LIKE ?3 ESCAPE '\\')"
                ),
                &[Param::Text(whole), Param::Text(first), Param::Text(last)],
            )
            .await?;
        Ok(customers)
    }
}
