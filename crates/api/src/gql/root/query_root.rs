use async_graphql::MergedObject;

use crate::gql::domains::admin::AdminQuery;
use crate::gql::domains::pools::PoolQuery;
use crate::gql::domains::reservations::ReservationQuery;

#[derive(MergedObject, Default)]
pub struct QueryRoot(AdminQuery, PoolQuery, ReservationQuery);
