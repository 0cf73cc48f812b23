// Response models for the REST API (v3).
//
// Records mirror the wire shape (camelCase). Callers can narrow responses
// with `fields=`, so everything except the collection envelope decodes
// with a default; vendor fields without a typed slot land in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Server-reported total. The alerts endpoint reports a negative value
    /// to mean "at least this many".
    #[serde(default)]
    pub total: i64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// Device (resource), from `/device/devices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Device {
    pub id: u64,
    pub display_name: String,
    /// Hostname or IP the collector polls.
    pub name: Option<String>,
    pub description: Option<String>,
    pub host_status: Option<String>,
    pub preferred_collector_id: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Datasource definition, from `/setting/datasources`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Datasource {
    pub id: u64,
    pub name: String,
    pub display_name: Option<String>,
    pub applies_to: Option<String>,
    pub collect_method: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A datasource applied to a device, from
/// `/device/devices/{deviceId}/devicedatasources`. Its `id` is the hdsId
/// that scopes instance queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceDatasource {
    pub id: u64,
    pub data_source_id: u64,
    pub device_id: u64,
    pub data_source_name: Option<String>,
    pub instance_number: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Datasource instance, from `.../devicedatasources/{hdsId}/instances`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instance {
    pub id: u64,
    pub name: String,
    pub display_name: Option<String>,
    pub device_id: u64,
    /// The owning hdsId.
    pub device_data_source_id: u64,
    pub data_source_id: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Alert, from `/alert/alerts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Alert {
    /// Alert ids are strings such as `"DS12345"`.
    pub id: String,
    pub resource_id: Option<u64>,
    /// 2 = warning, 3 = error, 4 = critical.
    pub severity: Option<u8>,
    pub cleared: bool,
    pub acked: bool,
    pub rule: Option<String>,
    /// Datasource name (the alert's template).
    pub resource_template_name: Option<String>,
    pub monitor_object_name: Option<String>,
    pub instance_name: Option<String>,
    pub start_epoch: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
