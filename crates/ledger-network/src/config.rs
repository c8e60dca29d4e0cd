use std::time::Duration;

use ledger_core::constants;

/// Every tunable enumerated in spec.md §6.4, gathered into one struct so a
/// hosting binary can override individual values without touching the
/// defaults baked into `ledger-core::constants`.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub max_connections: usize,
    pub min_connections: usize,
    pub health_check_interval: Duration,
    pub rotation_interval: Duration,
    pub heartbeat_interval: Duration,
    pub sync_poll_interval: Duration,
    pub sync_watchdog: Duration,
    pub presence_inactivity: Duration,
    pub app_message_max_retries: u32,
    pub app_message_backoff_min: Duration,
    pub app_message_backoff_max: Duration,
    pub app_message_queue_expiry: Duration,
    pub protocol_version: u32,
    pub reconnect_backoff_steps: Vec<Duration>,
    pub reconnect_backoff_max: Duration,
    pub reconnect_max_attempts: u32,
    pub transport_keepalive: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_connections: constants::MAX_CONNECTIONS,
            min_connections: constants::MIN_CONNECTIONS,
            health_check_interval: Duration::from_secs(constants::HEALTH_CHECK_INTERVAL_SECS),
            rotation_interval: Duration::from_secs(constants::ROTATION_INTERVAL_SECS),
            heartbeat_interval: Duration::from_secs(constants::HEARTBEAT_INTERVAL_SECS),
            sync_poll_interval: Duration::from_secs(constants::SYNC_POLL_INTERVAL_SECS),
            sync_watchdog: Duration::from_secs(constants::SYNC_WATCHDOG_SECS),
            presence_inactivity: Duration::from_secs(constants::PRESENCE_INACTIVITY_SECS as u64),
            app_message_max_retries: constants::APP_MESSAGE_MAX_RETRIES,
            app_message_backoff_min: Duration::from_secs(constants::APP_MESSAGE_BACKOFF_MIN_SECS),
            app_message_backoff_max: Duration::from_secs(constants::APP_MESSAGE_BACKOFF_MAX_SECS),
            app_message_queue_expiry: Duration::from_secs(constants::APP_MESSAGE_QUEUE_EXPIRY_SECS as u64),
            protocol_version: constants::PROTOCOL_VERSION,
            reconnect_backoff_steps: constants::RECONNECT_BACKOFF_STEPS_SECS
                .iter()
                .map(|secs| Duration::from_secs(*secs))
                .collect(),
            reconnect_backoff_max: Duration::from_secs(constants::RECONNECT_BACKOFF_MAX_SECS),
            reconnect_max_attempts: constants::RECONNECT_MAX_ATTEMPTS,
            transport_keepalive: Duration::from_secs(constants::TRANSPORT_KEEPALIVE_SECS),
        }
    }
}
