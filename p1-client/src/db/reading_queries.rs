use sqlx::{sqlite::SqlitePool, Executor, Statement};

use super::StoreError;
use crate::domain::{Reading, StoredReading};

const CREATE_READINGS: &str = r#"
    CREATE TABLE IF NOT EXISTS readings (
        timestamp INTEGER PRIMARY KEY,
        wifi_ssid TEXT,
        wifi_strength REAL,
        meter_model TEXT,
        unique_id TEXT,
        total_power_import_kwh REAL,
        total_power_import_t1_kwh REAL,
        total_power_export_kwh REAL,
        total_power_export_t1_kwh REAL,
        active_power_w REAL,
        active_power_l1_w REAL,
        active_power_l2_w REAL,
        active_power_l3_w REAL,
        active_voltage_l1_v REAL,
        active_voltage_l2_v REAL,
        active_voltage_l3_v REAL,
        active_current_l1_a REAL,
        active_current_l2_a REAL,
        active_current_l3_a REAL
    )
"#;

const UPSERT_READING: &str = r#"
    INSERT OR REPLACE INTO readings (
        timestamp,
        wifi_ssid,
        wifi_strength,
        meter_model,
        unique_id,
        total_power_import_kwh,
        total_power_import_t1_kwh,
        total_power_export_kwh,
        total_power_export_t1_kwh,
        active_power_w,
        active_power_l1_w,
        active_power_l2_w,
        active_power_l3_w,
        active_voltage_l1_v,
        active_voltage_l2_v,
        active_voltage_l3_v,
        active_current_l1_a,
        active_current_l2_a,
        active_current_l3_a
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const SELECT_READING: &str = r#"
    SELECT
        timestamp,
        wifi_ssid,
        wifi_strength,
        meter_model,
        unique_id,
        total_power_import_kwh,
        total_power_import_t1_kwh,
        total_power_export_kwh,
        total_power_export_t1_kwh,
        active_power_w,
        active_power_l1_w,
        active_power_l2_w,
        active_power_l3_w,
        active_voltage_l1_v,
        active_voltage_l2_v,
        active_voltage_l3_v,
        active_current_l1_a,
        active_current_l2_a,
        active_current_l3_a
    FROM readings
    WHERE timestamp = ?
"#;

/// Create the `readings` table if it does not exist yet.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    let statement = pool.prepare(CREATE_READINGS).await.map_err(StoreError::Prepare)?;
    statement
        .query()
        .execute(pool)
        .await
        .map_err(StoreError::Execute)?;
    Ok(())
}

/// Insert a reading under `timestamp`, replacing any row already stored at that second.
pub async fn save_reading(
    pool: &SqlitePool,
    timestamp: i64,
    reading: &Reading,
) -> Result<(), StoreError> {
    let statement = pool.prepare(UPSERT_READING).await.map_err(StoreError::Prepare)?;
    statement
        .query()
        .bind(timestamp)
        .bind(reading.wifi_ssid.as_str())
        .bind(reading.wifi_strength)
        .bind(reading.meter_model.as_str())
        .bind(reading.unique_id.as_str())
        .bind(reading.total_power_import_kwh)
        .bind(reading.total_power_import_t1_kwh)
        .bind(reading.total_power_export_kwh)
        .bind(reading.total_power_export_t1_kwh)
        .bind(reading.active_power_w)
        .bind(reading.active_power_l1_w)
        .bind(reading.active_power_l2_w)
        .bind(reading.active_power_l3_w)
        .bind(reading.active_voltage_l1_v)
        .bind(reading.active_voltage_l2_v)
        .bind(reading.active_voltage_l3_v)
        .bind(reading.active_current_l1_a)
        .bind(reading.active_current_l2_a)
        .bind(reading.active_current_l3_a)
        .execute(pool)
        .await
        .map_err(StoreError::Execute)?;
    Ok(())
}

/// Number of rows in the store.
pub async fn count_readings(pool: &SqlitePool) -> Result<i64, StoreError> {
    let statement = pool
        .prepare("SELECT COUNT(*) FROM readings")
        .await
        .map_err(StoreError::Prepare)?;
    statement
        .query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .map_err(StoreError::Execute)
}

/// Load the row stored at exactly `timestamp`.
pub async fn load_reading(pool: &SqlitePool, timestamp: i64) -> Result<StoredReading, StoreError> {
    let statement = pool.prepare(SELECT_READING).await.map_err(StoreError::Prepare)?;
    statement
        .query_as::<StoredReading>()
        .bind(timestamp)
        .fetch_optional(pool)
        .await
        .map_err(StoreError::Execute)?
        .ok_or(StoreError::NotFound { timestamp })
}

/// Delete the row stored at `timestamp`. Returns the number of rows removed.
pub async fn delete_reading(pool: &SqlitePool, timestamp: i64) -> Result<u64, StoreError> {
    let statement = pool
        .prepare("DELETE FROM readings WHERE timestamp = ?")
        .await
        .map_err(StoreError::Prepare)?;
    let result = statement
        .query()
        .bind(timestamp)
        .execute(pool)
        .await
        .map_err(StoreError::Execute)?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn sample(active_power_w: f64) -> Reading {
        Reading {
            wifi_ssid: "home".to_string(),
            wifi_strength: 64.0,
            meter_model: "ISKRA 2M550E-1012".to_string(),
            total_power_import_kwh: 35264.809,
            active_power_w,
            active_voltage_l1_v: 235.1,
            ..Reading::default()
        }
    }

    #[tokio::test]
    async fn save_then_load_returns_the_same_reading() {
        let pool = open_in_memory().await.unwrap();

        save_reading(&pool, 1_700_000_000, &sample(-11.0)).await.unwrap();
        let stored = load_reading(&pool, 1_700_000_000).await.unwrap();

        assert_eq!(stored.timestamp, 1_700_000_000);
        assert_eq!(stored.reading, sample(-11.0));
    }

    #[tokio::test]
    async fn saving_twice_at_the_same_second_replaces_the_row() {
        let pool = open_in_memory().await.unwrap();

        save_reading(&pool, 42, &sample(100.0)).await.unwrap();
        save_reading(&pool, 42, &sample(200.0)).await.unwrap();

        assert_eq!(count_readings(&pool).await.unwrap(), 1);
        let stored = load_reading(&pool, 42).await.unwrap();
        assert_eq!(stored.reading.active_power_w, 200.0);
    }

    #[tokio::test]
    async fn count_matches_number_of_distinct_timestamps() {
        let pool = open_in_memory().await.unwrap();
        assert_eq!(count_readings(&pool).await.unwrap(), 0);

        for ts in 0..5 {
            save_reading(&pool, 1_000 + ts, &sample(ts as f64)).await.unwrap();
        }

        assert_eq!(count_readings(&pool).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn load_of_unknown_timestamp_is_not_found() {
        let pool = open_in_memory().await.unwrap();

        let res = load_reading(&pool, 7).await;
        assert!(matches!(res, Err(StoreError::NotFound { timestamp: 7 })));
    }

    #[tokio::test]
    async fn delete_then_load_is_not_found() {
        let pool = open_in_memory().await.unwrap();
        save_reading(&pool, 9, &sample(1.0)).await.unwrap();

        assert_eq!(delete_reading(&pool, 9).await.unwrap(), 1);
        assert!(matches!(
            load_reading(&pool, 9).await,
            Err(StoreError::NotFound { timestamp: 9 })
        ));
        assert_eq!(count_readings(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_of_unknown_timestamp_removes_nothing() {
        let pool = open_in_memory().await.unwrap();
        assert_eq!(delete_reading(&pool, 9).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn create_schema_is_idempotent() {
        let pool = open_in_memory().await.unwrap();
        save_reading(&pool, 1, &sample(1.0)).await.unwrap();

        create_schema(&pool).await.unwrap();

        assert_eq!(count_readings(&pool).await.unwrap(), 1);
    }
}
