use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::services::ReservationCoordinator;
use crate::AppState;

/// Releases `pending` reservations nobody confirmed within the TTL.
pub struct ExpiryService {
    coordinator: ReservationCoordinator,
    state: AppState,
    ttl: ChronoDuration,
    interval: Interval,
}

impl ExpiryService {
    pub fn new(state: AppState) -> Self {
        let config = state.config();
        let ttl = ChronoDuration::minutes(config.reservation_pending_ttl_minutes as i64);
        let mut interval = interval(Duration::from_secs(
            config.reservation_sweep_interval_secs.max(1),
        ));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            coordinator: state.coordinator(),
            state,
            ttl,
            interval,
        }
    }

    pub async fn run(&mut self) {
        info!(ttl_minutes = self.ttl.num_minutes(), "Starting reservation expiry service");

        loop {
            self.interval.tick().await;

            if let Err(e) = self.sweep().await {
                error!("Error sweeping stale reservations: {}", e);
            }
        }
    }

    /// One pass: release every pending reservation created before now - TTL.
    /// Returns how many were released.
    pub async fn sweep(&self) -> Result<usize, AppError> {
        let cutoff = Utc::now() - self.ttl;
        let stale = self.state.store.stale_pending_reservations(cutoff).await?;

        let mut released = 0;
        for reservation_id in stale {
            match self.coordinator.expire(reservation_id).await {
                Ok(true) => released += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(%reservation_id, "Failed to expire reservation: {}", e);
                }
            }
        }

        Ok(released)
    }
}

/// Spawn the sweeper unless expiry is disabled (TTL of zero).
pub fn spawn_expiry_service(state: AppState) -> Option<tokio::task::JoinHandle<()>> {
    if state.config().reservation_pending_ttl_minutes == 0 {
        info!("Reservation expiry disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut service = ExpiryService::new(state);
        service.run().await;
    }))
}
