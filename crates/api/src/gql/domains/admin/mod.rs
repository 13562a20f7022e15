pub mod resolvers;

pub use resolvers::{AdminMutation, AdminQuery};
