use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use infra::BookingStore;

use crate::auth::JwtService;
use crate::config::AppConfig;
use crate::services::ReservationCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookingStore>,
    config: Arc<AppConfig>,
    jwt_service: JwtService,
}

impl AppState {
    pub fn new(store: Arc<dyn BookingStore>, config: AppConfig) -> Self {
        let jwt_service = JwtService::new(&config.jwt_secret);

        Self {
            store,
            config: Arc::new(config),
            jwt_service,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn coordinator(&self) -> ReservationCoordinator {
        ReservationCoordinator::new(self.store.clone())
    }

    /// Local offset of the pools, falling back to UTC for out-of-range values.
    pub fn pool_offset(&self) -> FixedOffset {
        self.config
            .pool_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}
