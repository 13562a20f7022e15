pub mod jwt;
pub mod permissions;

pub use jwt::{Claims, JwtService};
