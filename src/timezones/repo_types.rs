use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Immutable reference row; seeded by migration.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimeZone {
    pub id: Uuid,
    pub abbreviation: String,
    pub name: String,
    pub utc_offset: f64, // hours
}

/// Kept in sync with `migrations/0002_seed_time_zones.sql`.
pub const SEED_TIME_ZONES: &[(&str, &str, f64)] = &[
    ("UTC", "Coordinated Universal Time", 0.0),
    ("HST", "Hawaii Standard Time", -10.0),
    ("AKST", "Alaska Standard Time", -9.0),
    ("PST", "Pacific Standard Time", -8.0),
    ("MST", "Mountain Standard Time", -7.0),
    ("CST", "Central Standard Time", -6.0),
    ("EST", "Eastern Standard Time", -5.0),
    ("AST", "Atlantic Standard Time", -4.0),
    ("ART", "Argentina Time", -3.0),
    ("GMT", "Greenwich Mean Time", 0.0),
    ("CET", "Central European Time", 1.0),
    ("EET", "Eastern European Time", 2.0),
    ("MSK", "Moscow Standard Time", 3.0),
    ("IST", "India Standard Time", 5.5),
    ("CST-CN", "China Standard Time", 8.0),
    ("JST", "Japan Standard Time", 9.0),
    ("AEST", "Australian Eastern Standard Time", 10.0),
    ("NZST", "New Zealand Standard Time", 12.0),
];
