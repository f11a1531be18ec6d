//! Schema bootstrap

pub(crate) const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        email TEXT UNIQUE,
        city TEXT NOT NULL DEFAULT 'Delhi',
        full_name TEXT,
        preferred_language TEXT NOT NULL DEFAULT 'en',
        role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('admin', 'user')),
        created_at_ms INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sensor_readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pm10 REAL NOT NULL,
        pm25 REAL NOT NULL,
        co2 REAL NOT NULL,
        humidity REAL NOT NULL,
        temperature REAL NOT NULL,
        aqi_value INTEGER NOT NULL,
        aqi_level TEXT NOT NULL,
        location_lat REAL,
        location_lng REAL,
        location_name TEXT,
        created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
        recorded_at_ms INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_sensor_readings_recorded_at
        ON sensor_readings (recorded_at_ms DESC)",
    "CREATE TABLE IF NOT EXISTS user_alerts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        alert_type TEXT NOT NULL,
        threshold_value REAL NOT NULL,
        is_enabled INTEGER NOT NULL DEFAULT 1,
        created_at_ms INTEGER NOT NULL,
        updated_at_ms INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_user_alerts_user ON user_alerts (user_id)",
    "CREATE TABLE IF NOT EXISTS alert_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        alert_type TEXT NOT NULL,
        message TEXT NOT NULL,
        is_read INTEGER NOT NULL DEFAULT 0,
        sensor_reading_id INTEGER REFERENCES sensor_readings(id) ON DELETE SET NULL,
        created_at_ms INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_alert_logs_user_type
        ON alert_logs (user_id, alert_type, created_at_ms DESC)",
];
