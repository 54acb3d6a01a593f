//! SQLite-backed measurement store.
//!
//! The store owns a single connection for its whole lifetime. Each
//! `record_measurement` call runs the user get-or-create and the record
//! insert inside one transaction, so a record is either fully written or
//! not written at all. Cross-process locking is left to SQLite itself.

use crate::config::StoreConfig;
use crate::validation::validate_username;
use crate::{Config, HistoryOrder, Measurement, MeasurementRecord, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::time::Duration;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL
);

CREATE TABLE IF NOT EXISTS bmi_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    weight REAL NOT NULL,
    height REAL NOT NULL,
    bmi REAL NOT NULL,
    category TEXT NOT NULL,
    recorded_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now') || '000Z'),
    FOREIGN KEY (user_id) REFERENCES users (id)
);

CREATE INDEX IF NOT EXISTS idx_bmi_records_user_time
    ON bmi_records (user_id, recorded_at, id);
";

const HISTORY_ASC: &str = "
SELECT r.id, u.username, r.weight, r.height, r.bmi, r.category, r.recorded_at
FROM bmi_records r
JOIN users u ON r.user_id = u.id
WHERE u.username = ?1
ORDER BY r.recorded_at ASC, r.id ASC
";

const HISTORY_DESC: &str = "
SELECT r.id, u.username, r.weight, r.height, r.bmi, r.category, r.recorded_at
FROM bmi_records r
JOIN users u ON r.user_id = u.id
WHERE u.username = ?1
ORDER BY r.recorded_at DESC, r.id DESC
";

/// Connection settings for [`MeasurementStore::open`]
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Lock wait applied when another process holds the database
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::from(&StoreConfig::default())
    }
}

impl From<&StoreConfig> for StoreOptions {
    fn from(config: &StoreConfig) -> Self {
        Self {
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        }
    }
}

/// Fixed-width RFC 3339 UTC text, so lexical order is time order
///
/// The schema's column default pads SQLite's milliseconds to the same
/// six fractional digits.
fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(text: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MeasurementRecord> {
    let recorded_at: String = row.get(6)?;
    Ok(MeasurementRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        weight_kg: row.get(2)?,
        height_m: row.get(3)?,
        bmi: row.get(4)?,
        category: row.get(5)?,
        recorded_at: parse_timestamp(&recorded_at, 6)?,
    })
}

/// Resolve a username to its id, inserting the user if absent
fn get_or_create_user(tx: &Transaction<'_>, username: &str) -> rusqlite::Result<i64> {
    let inserted = tx.execute(
        "INSERT INTO users (username) VALUES (?1) ON CONFLICT(username) DO NOTHING",
        params![username],
    )?;
    if inserted > 0 {
        tracing::info!("Created user {:?}", username);
    }

    tx.query_row(
        "SELECT id FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )
}

/// Persistent per-user BMI history
pub struct MeasurementStore {
    conn: Connection,
}

impl MeasurementStore {
    /// Open (or create) the store at `path`
    ///
    /// The parent directory must already exist; an unreachable location
    /// surfaces as [`crate::Error::Storage`].
    pub fn open(path: impl AsRef<Path>, options: &StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let store = Self::init(conn, options)?;
        tracing::info!("Opened measurement store at {:?}", path);
        Ok(store)
    }

    /// Open the database file named by the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::open(config.database_path(), &StoreOptions::from(&config.store))
    }

    /// Private in-memory store, discarded on drop
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, &StoreOptions::default())
    }

    fn init(conn: Connection, options: &StoreOptions) -> Result<Self> {
        conn.busy_timeout(options.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Append a measurement for `username`, creating the user on first use
    ///
    /// Returns the stored record, including its id and timestamp.
    pub fn record_measurement(
        &mut self,
        username: &str,
        measurement: &Measurement,
    ) -> Result<MeasurementRecord> {
        self.record_measurement_at(username, measurement, Utc::now())
    }

    /// Same as [`Self::record_measurement`] with an explicit clock reading
    ///
    /// The stored timestamp never precedes the user's latest record, so
    /// per-user timestamps are monotonic in insertion order.
    pub(crate) fn record_measurement_at(
        &mut self,
        username: &str,
        measurement: &Measurement,
        now: DateTime<Utc>,
    ) -> Result<MeasurementRecord> {
        let username = validate_username(username)?;

        let tx = self.conn.transaction()?;
        let user_id = get_or_create_user(&tx, username)?;

        let latest: Option<String> = tx.query_row(
            "SELECT MAX(recorded_at) FROM bmi_records WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        let mut recorded_at = now.trunc_subsecs(6);
        if let Some(latest) = latest {
            let latest = parse_timestamp(&latest, 0)?;
            if latest > recorded_at {
                tracing::warn!(
                    "Clock is behind latest record for {:?} ({} < {}), reusing latest timestamp",
                    username,
                    recorded_at,
                    latest
                );
                recorded_at = latest;
            }
        }

        tx.execute(
            "INSERT INTO bmi_records (user_id, weight, height, bmi, category, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                measurement.weight_kg(),
                measurement.height_m(),
                measurement.bmi(),
                measurement.category(),
                format_timestamp(&recorded_at),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!("Recorded measurement {} for {:?}", id, username);

        Ok(MeasurementRecord {
            id,
            username: username.to_string(),
            weight_kg: measurement.weight_kg(),
            height_m: measurement.height_m(),
            bmi: measurement.bmi(),
            category: measurement.category(),
            recorded_at,
        })
    }

    /// All records for `username`, oldest first
    ///
    /// An unknown user yields an empty history.
    pub fn get_history(&self, username: &str) -> Result<Vec<MeasurementRecord>> {
        self.history(username, HistoryOrder::Ascending)
    }

    /// All records for `username` in the requested direction
    ///
    /// Ties on `recorded_at` are broken by insertion order.
    pub fn history(&self, username: &str, order: HistoryOrder) -> Result<Vec<MeasurementRecord>> {
        let sql = match order {
            HistoryOrder::Ascending => HISTORY_ASC,
            HistoryOrder::Descending => HISTORY_DESC,
        };

        let mut stmt = self.conn.prepare_cached(sql)?;
        let records = stmt
            .query_map(params![username.trim()], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        tracing::debug!("Loaded {} records for {:?}", records.len(), username);
        Ok(records)
    }

    /// Most recent record for `username`, if any
    pub fn latest(&self, username: &str) -> Result<Option<MeasurementRecord>> {
        let sql = format!("{} LIMIT 1", HISTORY_DESC.trim_end());
        let record = self
            .conn
            .query_row(&sql, params![username.trim()], record_from_row)
            .optional()?;
        Ok(record)
    }

    /// Every username that has been created
    pub fn list_users(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached("SELECT username FROM users")?;
        let users = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(users)
    }

    /// Close the connection, reporting any error SQLite raises on close
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        tracing::debug!("Closed measurement store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assess;
    use crate::{Category, Error};
    use chrono::Duration as ChronoDuration;

    fn store() -> MeasurementStore {
        crate::logging::init_test();
        MeasurementStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_record_and_read_back_exact_values() {
        let mut store = store();
        let m = assess(70.0, 1.75).unwrap();

        let stored = store.record_measurement("ana", &m).unwrap();
        let history = store.get_history("ana").unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0], stored);
        assert_eq!(history[0].weight_kg, 70.0);
        assert_eq!(history[0].height_m, 1.75);
        assert_eq!(history[0].bmi, 22.86);
        assert_eq!(history[0].category, Category::Normal);
    }

    #[test]
    fn test_history_matches_engine_in_call_order() {
        let mut store = store();
        let inputs = [(70.0, 1.75), (50.0, 1.6), (45.0, 1.6), (90.0, 1.7), (81.3, 1.82)];

        for (w, h) in inputs {
            store.record_measurement("ben", &assess(w, h).unwrap()).unwrap();
        }

        let history = store.get_history("ben").unwrap();
        assert_eq!(history.len(), inputs.len());
        for (record, (w, h)) in history.iter().zip(inputs) {
            let expected = assess(w, h).unwrap();
            assert_eq!(record.weight_kg, w);
            assert_eq!(record.height_m, h);
            assert_eq!(record.bmi, expected.bmi());
            assert_eq!(record.category, expected.category());
        }
    }

    #[test]
    fn test_unknown_user_has_empty_history() {
        let store = store();
        assert!(store.get_history("nonexistent-user").unwrap().is_empty());
        assert!(store.latest("nonexistent-user").unwrap().is_none());
    }

    #[test]
    fn test_upsert_creates_single_user() {
        let mut store = store();
        let m = assess(70.0, 1.75).unwrap();

        store.record_measurement("cleo", &m).unwrap();
        store.record_measurement("cleo", &m).unwrap();

        let users = store.list_users().unwrap();
        assert_eq!(users.iter().filter(|u| *u == "cleo").count(), 1);
        assert_eq!(store.get_history("cleo").unwrap().len(), 2);
    }

    #[test]
    fn test_usernames_are_case_sensitive_and_trimmed() {
        let mut store = store();
        let m = assess(70.0, 1.75).unwrap();

        store.record_measurement("Dana", &m).unwrap();
        store.record_measurement("dana", &m).unwrap();
        store.record_measurement("  Dana ", &m).unwrap();

        let mut users = store.list_users().unwrap();
        users.sort();
        assert_eq!(users, vec!["Dana".to_string(), "dana".to_string()]);
        assert_eq!(store.get_history("Dana").unwrap().len(), 2);
        assert_eq!(store.get_history("dana").unwrap().len(), 1);
    }

    #[test]
    fn test_empty_username_rejected_without_write() {
        let mut store = store();
        let m = assess(70.0, 1.75).unwrap();

        let err = store.record_measurement("   ", &m).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(store.list_users().unwrap().is_empty());
    }

    #[test]
    fn test_timestamp_collision_keeps_insertion_order() {
        let mut store = store();
        let at = Utc::now();

        for w in [60.0, 61.0, 62.0] {
            store
                .record_measurement_at("eli", &assess(w, 1.7).unwrap(), at)
                .unwrap();
        }

        let asc: Vec<f64> = store
            .get_history("eli")
            .unwrap()
            .iter()
            .map(|r| r.weight_kg)
            .collect();
        assert_eq!(asc, vec![60.0, 61.0, 62.0]);

        let desc: Vec<f64> = store
            .history("eli", HistoryOrder::Descending)
            .unwrap()
            .iter()
            .map(|r| r.weight_kg)
            .collect();
        assert_eq!(desc, vec![62.0, 61.0, 60.0]);
    }

    #[test]
    fn test_clock_stepping_back_keeps_timestamps_monotonic() {
        let mut store = store();
        let now = Utc::now();

        let first = store
            .record_measurement_at("fay", &assess(70.0, 1.7).unwrap(), now)
            .unwrap();
        let second = store
            .record_measurement_at(
                "fay",
                &assess(71.0, 1.7).unwrap(),
                now - ChronoDuration::hours(1),
            )
            .unwrap();

        assert_eq!(second.recorded_at, first.recorded_at);
        let history = store.get_history("fay").unwrap();
        assert_eq!(history[0].id, first.id);
        assert_eq!(history[1].id, second.id);
    }

    #[test]
    fn test_histories_are_isolated_per_user() {
        let mut store = store();
        store.record_measurement("gus", &assess(70.0, 1.75).unwrap()).unwrap();
        store.record_measurement("hal", &assess(90.0, 1.7).unwrap()).unwrap();

        let gus = store.get_history("gus").unwrap();
        assert_eq!(gus.len(), 1);
        assert_eq!(gus[0].username, "gus");
        assert_eq!(store.latest("hal").unwrap().unwrap().category, Category::Obese);
    }

    #[test]
    fn test_history_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bmi_data.db");

        {
            let mut store = MeasurementStore::open(&path, &StoreOptions::default()).unwrap();
            store.record_measurement("ivy", &assess(50.0, 1.6).unwrap()).unwrap();
            store.close().unwrap();
        }

        let store = MeasurementStore::open(&path, &StoreOptions::default()).unwrap();
        let history = store.get_history("ivy").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].bmi, 19.53);
        assert_eq!(store.list_users().unwrap(), vec!["ivy".to_string()]);
    }

    #[test]
    fn test_unreachable_location_is_storage_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing").join("bmi_data.db");

        let err = MeasurementStore::open(&path, &StoreOptions::default())
            .err()
            .expect("open should fail");
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_column_default_timestamp_matches_written_width() {
        let mut store = store();
        let written = store
            .record_measurement("kai", &assess(70.0, 1.75).unwrap())
            .unwrap();

        // Row inserted without an explicit timestamp
        store
            .conn
            .execute(
                "INSERT INTO bmi_records (user_id, weight, height, bmi, category)
                 SELECT id, 71.0, 1.75, 23.18, 'Normal' FROM users WHERE username = 'kai'",
                [],
            )
            .unwrap();

        let stamps: Vec<String> = store
            .conn
            .prepare("SELECT recorded_at FROM bmi_records ORDER BY id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(stamps.len(), 2);
        assert_eq!(stamps[0], format_timestamp(&written.recorded_at));
        assert_eq!(stamps[1].len(), stamps[0].len());
        assert!(stamps[1].ends_with("000Z"));

        // Defaulted text parses back like any written timestamp
        assert_eq!(store.get_history("kai").unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_category_label_surfaces_as_storage_error() {
        let mut store = store();
        store.record_measurement("jo", &assess(70.0, 1.75).unwrap()).unwrap();
        store
            .conn
            .execute("UPDATE bmi_records SET category = 'Skinny'", [])
            .unwrap();

        let err = store.get_history("jo").unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
