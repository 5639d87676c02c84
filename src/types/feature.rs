pub const PREMIUM_FEATURES: &str = "premium_features";
pub const ADVANCED_ANALYTICS: &str = "advanced_analytics";
pub const EXPORT_DATA: &str = "export_data";
pub const DARK_MODE: &str = "dark_mode";
pub const NOTIFICATIONS: &str = "notifications";
pub const BACKUP_SYNC: &str = "backup_sync";

pub const KNOWN_FLAGS: [&str; 6] = [
    PREMIUM_FEATURES,
    ADVANCED_ANALYTICS,
    EXPORT_DATA,
    DARK_MODE,
    NOTIFICATIONS,
    BACKUP_SYNC,
];
