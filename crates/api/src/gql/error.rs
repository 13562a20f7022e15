//! GraphQL rendering of [`AppError`].
//!
//! Every resolver error carries `extensions.code` (the stable error code)
//! and `extensions.retryable`, which is only true for infrastructure
//! failures.

use async_graphql::ErrorExtensions;

use crate::error::AppError;

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.code());
            e.set("retryable", self.retryable());
        })
    }
}

/// Converts `Result<T, AppError>` into `async_graphql::Result<T>` keeping
/// the error extensions.
///
/// Usage: `coordinator.confirm(admin_id, id).await.gql()?`
pub trait GqlResultExt<T> {
    fn gql(self) -> async_graphql::Result<T>;
}

impl<T> GqlResultExt<T> for Result<T, AppError> {
    fn gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.extend())
    }
}
