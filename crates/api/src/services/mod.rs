pub mod access;
pub mod availability;
pub mod expiry_service;
pub mod profiles;
pub mod propagation;
pub mod reservations;
pub mod slots;

pub use expiry_service::{spawn_expiry_service, ExpiryService};
pub use reservations::ReservationCoordinator;
