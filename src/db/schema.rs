//! SQL DDL and catalog seed for the subscription store.
//! SQLite-first; statements are split on `;` and run one by one, so neither
//! block may contain a semicolon inside a literal.

/// Tables, in foreign-key order.
/// - ids are TEXT (UUID v4, or readable ids for seeded catalog rows)
/// - timestamps are RFC 3339 TEXT, calendar dates are `YYYY-MM-DD` TEXT
/// - booleans are INTEGER 0/1
/// - JSON columns are TEXT
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS currencies (
    id TEXT PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    symbol TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT NULL,
    icon TEXT NULL,
    color TEXT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS billing_cycles (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL CHECK (type IN ('daily', 'weekly', 'monthly', 'quarterly', 'yearly')),
    days INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS subscription_providers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NULL,
    website_url TEXT NULL,
    logo_url TEXT NULL,
    category_id TEXT NULL REFERENCES categories(id) ON DELETE SET NULL,
    is_popular INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS auth_users (
    id TEXT PRIMARY KEY,
    provider TEXT NOT NULL,
    subject TEXT NOT NULL,
    email TEXT NOT NULL,
    full_name TEXT NULL,
    avatar_url TEXT NULL,
    created_at TEXT NOT NULL,
    last_sign_in_at TEXT NOT NULL,
    UNIQUE (provider, subject)
);

CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES auth_users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY REFERENCES auth_users(id) ON DELETE CASCADE,
    email TEXT NOT NULL,
    full_name TEXT NULL,
    avatar_url TEXT NULL,
    currency_id TEXT NULL REFERENCES currencies(id),
    timezone TEXT NOT NULL DEFAULT 'Europe/Bucharest',
    notification_preferences TEXT NOT NULL DEFAULT '{"push":true,"email":true,"days_before":3}',
    onboarding_completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subscriptions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    provider_id TEXT NULL REFERENCES subscription_providers(id) ON DELETE SET NULL,
    custom_provider_name TEXT NULL,
    name TEXT NOT NULL,
    description TEXT NULL,
    amount REAL NOT NULL,
    currency_id TEXT NOT NULL REFERENCES currencies(id),
    billing_cycle_id TEXT NOT NULL REFERENCES billing_cycles(id),
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'paused', 'cancelled', 'expired')),
    start_date TEXT NOT NULL,
    next_billing_date TEXT NOT NULL,
    end_date TEXT NULL,
    auto_renew INTEGER NOT NULL DEFAULT 1,
    notes TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_subscriptions_user_next ON subscriptions(user_id, next_billing_date);

CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    subscription_id TEXT NULL REFERENCES subscriptions(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    sent_at TEXT NOT NULL,
    read_at TEXT NULL,
    metadata TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_notifications_user_id ON notifications(user_id, sent_at);

CREATE TABLE IF NOT EXISTS feature_flags (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NULL,
    is_enabled INTEGER NOT NULL DEFAULT 0,
    user_id TEXT NULL REFERENCES users(id) ON DELETE CASCADE,
    metadata TEXT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_feature_flags_name ON feature_flags(name, user_id)
"#;

/// Catalog rows every installation starts with. `INSERT OR IGNORE` keeps
/// re-runs idempotent and leaves operator edits alone.
pub const SQLITE_SEED: &str = r#"
INSERT OR IGNORE INTO currencies (id, code, name, symbol) VALUES
    ('cur-ron', 'RON', 'Romanian Leu', 'lei'),
    ('cur-eur', 'EUR', 'Euro', '€'),
    ('cur-usd', 'USD', 'US Dollar', '$'),
    ('cur-gbp', 'GBP', 'British Pound', '£'),
    ('cur-chf', 'CHF', 'Swiss Franc', 'CHF'),
    ('cur-cad', 'CAD', 'Canadian Dollar', 'C$'),
    ('cur-aud', 'AUD', 'Australian Dollar', 'A$');

INSERT OR IGNORE INTO billing_cycles (id, name, type, days) VALUES
    ('cycle-daily', 'Daily', 'daily', 1),
    ('cycle-weekly', 'Weekly', 'weekly', 7),
    ('cycle-monthly', 'Monthly', 'monthly', 30),
    ('cycle-quarterly', 'Quarterly', 'quarterly', 90),
    ('cycle-yearly', 'Yearly', 'yearly', 365);

INSERT OR IGNORE INTO categories (id, name, description, icon, color) VALUES
    ('cat-streaming', 'Streaming', 'Video and audio streaming', 'tv', '#E50914'),
    ('cat-software', 'Software', 'Applications and tools', 'code', '#0078D4'),
    ('cat-cloud-storage', 'Cloud Storage', 'Online storage and backup', 'cloud', '#4285F4'),
    ('cat-gaming', 'Gaming', 'Game services and passes', 'gamepad', '#107C10'),
    ('cat-news-media', 'News & Media', 'News and magazines', 'newspaper', '#333333'),
    ('cat-productivity', 'Productivity', 'Work and organisation', 'briefcase', '#F2C811'),
    ('cat-fitness-health', 'Fitness & Health', 'Training and wellbeing', 'heart', '#FF4F5A'),
    ('cat-education', 'Education', 'Courses and learning', 'book', '#6C5CE7'),
    ('cat-finance', 'Finance', 'Banking and budgeting', 'wallet', '#00B894'),
    ('cat-communication', 'Communication', 'Messaging and calls', 'chat', '#4A154B'),
    ('cat-other', 'Other', 'Everything else', 'dots', '#95A5A6');

INSERT OR IGNORE INTO subscription_providers (id, name, description, website_url, category_id, is_popular) VALUES
    ('prov-netflix', 'Netflix', 'Movies and TV shows', 'https://www.netflix.com', 'cat-streaming', 1),
    ('prov-spotify', 'Spotify', 'Music and podcasts', 'https://www.spotify.com', 'cat-streaming', 1),
    ('prov-disney-plus', 'Disney+', 'Disney, Pixar, Marvel and Star Wars', 'https://www.disneyplus.com', 'cat-streaming', 1),
    ('prov-hbo-max', 'HBO Max', 'HBO originals and movies', 'https://www.max.com', 'cat-streaming', 1),
    ('prov-amazon-prime', 'Amazon Prime Video', 'Prime Video streaming', 'https://www.primevideo.com', 'cat-streaming', 0),
    ('prov-youtube-premium', 'YouTube Premium', 'Ad-free YouTube and YouTube Music', 'https://www.youtube.com/premium', 'cat-streaming', 1),
    ('prov-microsoft-365', 'Microsoft 365', 'Office apps and OneDrive storage', 'https://www.microsoft.com/microsoft-365', 'cat-software', 1),
    ('prov-adobe-creative', 'Adobe Creative Cloud', 'Creative apps', 'https://www.adobe.com/creativecloud.html', 'cat-software', 0),
    ('prov-figma', 'Figma', 'Collaborative design', 'https://www.figma.com', 'cat-software', 0),
    ('prov-notion', 'Notion', 'Notes and workspaces', 'https://www.notion.so', 'cat-productivity', 0),
    ('prov-slack', 'Slack', 'Team messaging', 'https://slack.com', 'cat-communication', 0),
    ('prov-playstation-plus', 'PlayStation Plus', 'Online play and monthly games', 'https://www.playstation.com/ps-plus', 'cat-gaming', 1),
    ('prov-xbox-game-pass', 'Xbox Game Pass', 'Game library subscription', 'https://www.xbox.com/xbox-game-pass', 'cat-gaming', 1),
    ('prov-steam', 'Steam', 'PC games store', 'https://store.steampowered.com', 'cat-gaming', 0),
    ('prov-nintendo-online', 'Nintendo Switch Online', 'Online play for Switch', 'https://www.nintendo.com/switch/online', 'cat-gaming', 0)
"#;
