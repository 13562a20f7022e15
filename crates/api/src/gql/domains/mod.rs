// Each domain contains: mod.rs, resolvers.rs, types.rs

pub mod admin;
pub mod pools;
pub mod profiles;
pub mod reservations;
