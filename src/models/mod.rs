pub mod customer;
pub mod reservation;

pub use customer::Customer;
pub use reservation::{Reservation, ReservationRepository, ReservationSource};
