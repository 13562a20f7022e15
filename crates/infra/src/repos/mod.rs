pub mod lane_reservations;
pub mod lane_schedules;
pub mod memberships;
pub mod pools;
pub mod users;

pub use lane_schedules::CreateLaneSchedule;
pub use memberships::CreateMembership;
pub use pools::PoolFilter;
pub use users::CreateProfile;
