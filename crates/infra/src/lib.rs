pub mod db;
pub mod models;
pub mod repos;
pub mod store;

pub use db::Db;
pub use store::{
    BookingStore, ClaimError, MemoryBookingStore, PgBookingStore, ReservationTransition, StoreError,
};
