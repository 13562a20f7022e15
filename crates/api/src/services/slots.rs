use infra::models::{LaneScheduleRow, LaneScheduleStatus};
use infra::BookingStore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::access;

/// Admin override of a single slot: `available -> blocked`,
/// `blocked -> available` and `confirmed -> blocked`.
///
/// The write only lands if the slot still has the status and holder that
/// were read, so a reservation racing with the admin makes this fail with a
/// conflict instead of being overwritten.
pub async fn set_slot_status(
    store: &dyn BookingStore,
    admin_id: Uuid,
    slot_id: Uuid,
    target: LaneScheduleStatus,
) -> Result<LaneScheduleRow, AppError> {
    let slot = store
        .get_slot(slot_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("slot {slot_id} not found")))?;

    access::require_pool_admin(store, admin_id, slot.pool_id).await?;

    if !(slot.status.can_transition_to(target) && slot.status.is_admin_transition(target)) {
        return Err(AppError::Validation(format!(
            "cannot change slot from {} to {}",
            slot.status, target
        )));
    }

    // A blocked slot that was closed while confirmed still belongs to its reservation
    if target == LaneScheduleStatus::Available {
        if let Some(holder) = slot.reservation_id {
            return Err(AppError::Conflict(format!(
                "slot is still held by reservation {holder}"
            )));
        }
    }

    match store
        .set_slot_status_if(slot_id, slot.status, slot.reservation_id, target)
        .await?
    {
        Some(updated) => {
            info!(%slot_id, %admin_id, from = %slot.status, to = %target, "slot status changed");
            Ok(updated)
        }
        None => {
            warn!(%slot_id, expected = %slot.status, "slot changed before admin update");
            Err(AppError::Conflict(format!(
                "slot {slot_id} changed concurrently, reload and retry"
            )))
        }
    }
}
