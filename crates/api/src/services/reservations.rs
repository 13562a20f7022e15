use std::collections::HashSet;
use std::sync::Arc;

use infra::models::{ReservationStatus, ReservationWithSlots, MAX_SLOTS_PER_RESERVATION};
use infra::{BookingStore, ReservationTransition};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{join_ids, AppError};
use crate::services::access;

/// Check a requested batch before it reaches the store.
pub fn validate_slot_ids(slot_ids: &[Uuid]) -> Result<(), AppError> {
    if slot_ids.is_empty() {
        return Err(AppError::Validation("no slots provided".to_string()));
    }
    if slot_ids.len() > MAX_SLOTS_PER_RESERVATION {
        return Err(AppError::Validation(format!(
            "cardinality exceeded: at most {MAX_SLOTS_PER_RESERVATION} slots per reservation, got {}",
            slot_ids.len()
        )));
    }

    let mut seen = HashSet::with_capacity(slot_ids.len());
    for id in slot_ids {
        if !seen.insert(id) {
            return Err(AppError::Validation(format!("duplicate slot id: {id}")));
        }
    }
    Ok(())
}

/// Creates reservations and moves them through their lifecycle. All slot
/// effects happen inside the store, one transaction per call.
#[derive(Clone)]
pub struct ReservationCoordinator {
    store: Arc<dyn BookingStore>,
}

impl ReservationCoordinator {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Claim every slot in `slot_ids` for `user_id`, or none of them.
    pub async fn create_reservation(
        &self,
        user_id: Uuid,
        slot_ids: &[Uuid],
    ) -> Result<ReservationWithSlots, AppError> {
        validate_slot_ids(slot_ids)?;

        match self.store.claim_slots(user_id, slot_ids).await {
            Ok(reservation) => {
                info!(
                    reservation_id = %reservation.reservation.id,
                    %user_id,
                    slots = slot_ids.len(),
                    "reservation created"
                );
                Ok(reservation)
            }
            Err(e) => {
                let err = AppError::from(e);
                if matches!(err, AppError::Conflict(_)) {
                    warn!(%user_id, slots = %join_ids(slot_ids), "reservation lost a slot race");
                }
                Err(err)
            }
        }
    }

    /// Return the reservation's slots to inventory and mark it canceled.
    /// Calling it on a canceled or rejected reservation changes nothing.
    pub async fn release_slots(
        &self,
        reservation_id: Uuid,
    ) -> Result<ReservationWithSlots, AppError> {
        match self
            .store
            .transition_reservation(reservation_id, ReservationStatus::Canceled, None)
            .await?
        {
            ReservationTransition::Applied(reservation) => {
                info!(%reservation_id, "reservation released");
                Ok(reservation)
            }
            ReservationTransition::Unchanged(reservation) => Ok(reservation),
            ReservationTransition::NotFound => Err(not_found(reservation_id)),
        }
    }

    /// Release a reservation only if it is still `pending`. Returns `false`
    /// when it was confirmed or closed in the meantime.
    pub async fn expire(&self, reservation_id: Uuid) -> Result<bool, AppError> {
        match self
            .store
            .transition_reservation(
                reservation_id,
                ReservationStatus::Canceled,
                Some(ReservationStatus::Pending),
            )
            .await?
        {
            ReservationTransition::Applied(_) => {
                info!(%reservation_id, "pending reservation expired");
                Ok(true)
            }
            ReservationTransition::Unchanged(_) => Ok(false),
            ReservationTransition::NotFound => Err(not_found(reservation_id)),
        }
    }

    /// Cancel on behalf of `actor_id`: the owner may always cancel, anyone
    /// else needs membership on every pool involved.
    pub async fn cancel_reservation(
        &self,
        actor_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<ReservationWithSlots, AppError> {
        let current = self.load(reservation_id).await?;
        if current.reservation.user_id != actor_id {
            self.require_admin_for(actor_id, reservation_id).await?;
        }
        self.release_slots(reservation_id).await
    }

    pub async fn confirm(
        &self,
        admin_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<ReservationWithSlots, AppError> {
        self.admin_transition(admin_id, reservation_id, ReservationStatus::Confirmed)
            .await
    }

    pub async fn reject(
        &self,
        admin_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<ReservationWithSlots, AppError> {
        self.admin_transition(admin_id, reservation_id, ReservationStatus::Rejected)
            .await
    }

    /// Visible to its owner and to admins of every pool it touches.
    pub async fn get_reservation(
        &self,
        viewer_id: Uuid,
        reservation_id: Uuid,
    ) -> Result<ReservationWithSlots, AppError> {
        let reservation = self.load(reservation_id).await?;
        if reservation.reservation.user_id != viewer_id {
            self.require_admin_for(viewer_id, reservation_id).await?;
        }
        Ok(reservation)
    }

    async fn admin_transition(
        &self,
        admin_id: Uuid,
        reservation_id: Uuid,
        next: ReservationStatus,
    ) -> Result<ReservationWithSlots, AppError> {
        self.load(reservation_id).await?;
        self.require_admin_for(admin_id, reservation_id).await?;

        match self
            .store
            .transition_reservation(reservation_id, next, None)
            .await?
        {
            ReservationTransition::Applied(reservation) => {
                info!(%reservation_id, %admin_id, status = %next, "reservation updated");
                Ok(reservation)
            }
            ReservationTransition::Unchanged(reservation) => {
                warn!(
                    %reservation_id,
                    current = %reservation.reservation.status,
                    requested = %next,
                    "reservation transition refused"
                );
                Err(AppError::Conflict(format!(
                    "reservation is {}, only pending reservations can be {}",
                    reservation.reservation.status, next
                )))
            }
            ReservationTransition::NotFound => Err(not_found(reservation_id)),
        }
    }

    async fn load(&self, reservation_id: Uuid) -> Result<ReservationWithSlots, AppError> {
        self.store
            .get_reservation(reservation_id)
            .await?
            .ok_or_else(|| not_found(reservation_id))
    }

    async fn require_admin_for(&self, admin_id: Uuid, reservation_id: Uuid) -> Result<(), AppError> {
        let pool_ids = self.store.reservation_pool_ids(reservation_id).await?;
        access::require_admin_of_all(self.store.as_ref(), admin_id, &pool_ids).await
    }
}

fn not_found(reservation_id: Uuid) -> AppError {
    AppError::NotFound(format!("reservation {reservation_id} not found"))
}
