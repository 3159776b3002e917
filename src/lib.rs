pub mod bootstrap;
pub mod error;
pub mod models;
pub mod orm;
pub mod ranking;
pub mod repository;
pub mod search;
pub mod settings;

pub use error::CustomerError;
pub use models::{Customer, Reservation, ReservationRepository, ReservationSource};
pub use ranking::TopCustomer;
pub use repository::CustomerRepository;
pub use search::NameQuery;

inventory::collect!(crate::orm::Migration);
