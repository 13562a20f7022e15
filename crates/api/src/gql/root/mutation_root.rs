use async_graphql::MergedObject;

use crate::gql::domains::admin::AdminMutation;
use crate::gql::domains::profiles::ProfileMutation;
use crate::gql::domains::reservations::ReservationMutation;

#[derive(MergedObject, Default)]
pub struct MutationRoot(AdminMutation, ProfileMutation, ReservationMutation);
