use serde::Deserialize;
use serde_with::{serde_as, DefaultOnNull};

/// One snapshot of P1 meter telemetry as served by `GET /api/v1/data`.
///
/// Keys that are missing or `null` decode to their zero value, unknown keys are ignored.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct Reading {
    #[serde_as(as = "DefaultOnNull")]
    pub wifi_ssid: String,
    #[serde_as(as = "DefaultOnNull")]
    pub wifi_strength: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub meter_model: String,
    #[serde_as(as = "DefaultOnNull")]
    pub unique_id: String,
    #[serde_as(as = "DefaultOnNull")]
    pub total_power_import_kwh: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub total_power_import_t1_kwh: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub total_power_export_kwh: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub total_power_export_t1_kwh: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub active_power_w: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub active_power_l1_w: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub active_power_l2_w: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub active_power_l3_w: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub active_voltage_l1_v: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub active_voltage_l2_v: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub active_voltage_l3_v: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub active_current_l1_a: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub active_current_l2_a: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub active_current_l3_a: f64,
}

impl Reading {
    /// Numeric fields in column order, keyed by their wire name.
    pub fn numeric_fields(&self) -> [(&'static str, f64); 15] {
        [
            ("wifi_strength", self.wifi_strength),
            ("total_power_import_kwh", self.total_power_import_kwh),
            ("total_power_import_t1_kwh", self.total_power_import_t1_kwh),
            ("total_power_export_kwh", self.total_power_export_kwh),
            ("total_power_export_t1_kwh", self.total_power_export_t1_kwh),
            ("active_power_w", self.active_power_w),
            ("active_power_l1_w", self.active_power_l1_w),
            ("active_power_l2_w", self.active_power_l2_w),
            ("active_power_l3_w", self.active_power_l3_w),
            ("active_voltage_l1_v", self.active_voltage_l1_v),
            ("active_voltage_l2_v", self.active_voltage_l2_v),
            ("active_voltage_l3_v", self.active_voltage_l3_v),
            ("active_current_l1_a", self.active_current_l1_a),
            ("active_current_l2_a", self.active_current_l2_a),
            ("active_current_l3_a", self.active_current_l3_a),
        ]
    }
}

/// A persisted reading together with the second it was written at.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredReading {
    pub timestamp: i64,
    #[sqlx(flatten)]
    pub reading: Reading,
}
