// Datasource instance endpoints
//
// Instances hang off a device's datasource association:
// `/device/devices/{deviceId}/devicedatasources/{hdsId}/instances`.
// Both accessors resolve names to ids first, strictly in dependency order.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::filter::Filters;
use crate::models::Instance;
use crate::rest::client::LmClient;
use crate::rest::devices::{non_empty, non_zero};
use crate::rest::paginate::DEFAULT_PAGE_SIZE;
use crate::transport::{ApiRequest, Transport};

fn instances_path(device_id: u64, hds_id: u64) -> String {
    format!("/device/devices/{device_id}/devicedatasources/{hds_id}/instances")
}

/// Parameters for [`LmClient::get_datasource_instances`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceListOptions {
    pub device_id: Option<u64>,
    pub device_name: Option<String>,
    pub datasource_id: Option<u64>,
    pub datasource_name: Option<String>,
    pub filters: Filters,
    pub fields: Option<String>,
    pub fetch_all: bool,
    pub size: u32,
}

impl Default for InstanceListOptions {
    fn default() -> Self {
        Self {
            device_id: None,
            device_name: None,
            datasource_id: None,
            datasource_name: None,
            filters: Filters::new(),
            fields: None,
            fetch_all: false,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Parameters for [`LmClient::get_datasource_instance_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDataQuery {
    pub device_id: Option<u64>,
    pub device_name: Option<String>,
    pub datasource_id: Option<u64>,
    pub datasource_name: Option<String>,
    pub instance_id: Option<u64>,
    pub instance_name: Option<String>,
    /// Window start, epoch seconds.
    pub start: Option<i64>,
    /// Window end, epoch seconds.
    pub end: Option<i64>,
    /// Comma-separated datapoint names.
    pub datapoints: Option<String>,
    pub period: u32,
}

impl Default for InstanceDataQuery {
    fn default() -> Self {
        Self {
            device_id: None,
            device_name: None,
            datasource_id: None,
            datasource_name: None,
            instance_id: None,
            instance_name: None,
            start: None,
            end: None,
            datapoints: None,
            period: 1,
        }
    }
}

impl InstanceDataQuery {
    /// Set `start`/`end` from a UTC time range.
    pub fn time_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start.timestamp());
        self.end = Some(end.timestamp());
        self
    }
}

impl<T: Transport> LmClient<T> {
    /// List the instances of a datasource on a device.
    ///
    /// An unknown device name or a datasource not applied to the device is
    /// an error, not an empty list.
    pub async fn get_datasource_instances(
        &self,
        options: &InstanceListOptions,
    ) -> Result<Vec<Instance>, Error> {
        let device_id = self
            .resolve_device_id(options.device_id, options.device_name.as_deref())
            .await?;
        let hds = self
            .resolve_device_datasource(
                device_id,
                options.datasource_id,
                options.datasource_name.as_deref(),
            )
            .await?;

        self.list(
            &instances_path(device_id, hds.id),
            &options.filters,
            options.fields.as_deref(),
            options.fetch_all,
            options.size,
        )
        .await
    }

    /// Fetch time-series data for one instance.
    ///
    /// Returns the response body unmodified. Each name is resolved in turn
    /// and the first one that fails ends the call.
    pub async fn get_datasource_instance_data(
        &self,
        query: &InstanceDataQuery,
    ) -> Result<Value, Error> {
        let instance_name = non_empty(query.instance_name.as_deref());
        let datasource_name = non_empty(query.datasource_name.as_deref());

        if non_zero(query.datasource_id).is_none() && datasource_name.is_none() {
            return Err(Error::missing(
                "Either datasourceId or datasourceName must be provided",
            ));
        }
        if non_zero(query.instance_id).is_none() && instance_name.is_none() {
            return Err(Error::missing(
                "Either instanceId or instanceName must be provided",
            ));
        }

        let device_id = self
            .resolve_device_id(query.device_id, query.device_name.as_deref())
            .await?;
        let hds = self
            .resolve_device_datasource(device_id, query.datasource_id, datasource_name)
            .await?;
        let path = instances_path(device_id, hds.id);

        let instance_id = match (non_zero(query.instance_id), instance_name) {
            (Some(id), _) => id,
            (None, Some(name)) => {
                debug!(name, hds_id = hds.id, "resolving instance");
                let filter = Filters::new().with("name", name);
                let found: Vec<Instance> =
                    self.list(&path, &filter, None, false, DEFAULT_PAGE_SIZE).await?;
                match found.first() {
                    Some(instance) => instance.id,
                    None => {
                        return Err(Error::unresolved(format!(
                            "Instance with name {name} not found"
                        )));
                    }
                }
            }
            (None, None) => {
                return Err(Error::missing(
                    "Either instanceId or instanceName must be provided",
                ));
            }
        };

        let request = ApiRequest::get(format!("{path}/{instance_id}/data"))
            .query("period", query.period);
        let request = match query.start {
            Some(start) => request.query("start", start),
            None => request,
        };
        let request = match query.end {
            Some(end) => request.query("end", end),
            None => request,
        };
        let request = request.query_opt("datapoints", query.datapoints.as_deref());

        self.execute(&request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::rest::mock::ScriptedTransport;

    fn device_page() -> Value {
        json!({ "items": [{ "id": 12, "displayName": "web-01" }], "total": 1 })
    }

    fn datasource_page() -> Value {
        json!({ "items": [{ "id": 7, "name": "CPU" }], "total": 1 })
    }

    fn hds_page() -> Value {
        json!({ "items": [{ "id": 900, "dataSourceId": 7, "deviceId": 12 }], "total": 1 })
    }

    #[tokio::test]
    async fn instances_resolve_names_then_list() {
        let transport = ScriptedTransport::new()
            .respond(200, device_page())
            .respond(200, datasource_page())
            .respond(200, hds_page())
            .respond(
                200,
                json!({ "items": [{ "id": 1, "name": "eth0" }, { "id": 2, "name": "eth1" }],
                        "total": 2 }),
            );
        let client = LmClient::with_transport(transport);

        let instances = client
            .get_datasource_instances(&InstanceListOptions {
                device_name: Some("web-01".into()),
                datasource_name: Some("CPU".into()),
                filters: Filters::new().with("name", "*eth*"),
                ..InstanceListOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(instances.len(), 2);

        assert_eq!(
            client.transport().paths(),
            vec![
                "/device/devices",
                "/setting/datasources",
                "/device/devices/12/devicedatasources",
                "/device/devices/12/devicedatasources/900/instances",
            ]
        );
        let sent = client.transport().sent();
        assert_eq!(sent[3].request.query_value("filter"), Some("name:\"*eth*\""));
        assert_eq!(sent[3].request.query_value("size"), Some("50"));
    }

    #[tokio::test]
    async fn instances_unknown_device_is_hard_error() {
        let transport = ScriptedTransport::new().respond(200, json!({ "items": [], "total": 0 }));
        let client = LmClient::with_transport(transport);

        let err = client
            .get_datasource_instances(&InstanceListOptions {
                device_name: Some("ghost".into()),
                datasource_id: Some(7),
                ..InstanceListOptions::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Device with name ghost not found");
    }

    #[tokio::test]
    async fn instances_missing_association_is_hard_error() {
        let transport = ScriptedTransport::new().respond(200, json!({ "items": [], "total": 0 }));
        let client = LmClient::with_transport(transport);

        let err = client
            .get_datasource_instances(&InstanceListOptions {
                device_id: Some(12),
                datasource_id: Some(7),
                ..InstanceListOptions::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unresolved { .. }));
        assert_eq!(client.transport().sent().len(), 1);
    }

    #[tokio::test]
    async fn instance_data_full_chain() {
        let transport = ScriptedTransport::new()
            .respond(200, device_page())
            .respond(200, datasource_page())
            .respond(200, hds_page())
            .respond(200, json!({ "items": [{ "id": 31, "name": "CPU-0" }], "total": 1 }))
            .respond(
                200,
                json!({ "dataPoints": ["CPUBusyPercent"], "values": [[12.5]], "time": [1] }),
            );
        let client = LmClient::with_transport(transport);

        let query = InstanceDataQuery {
            device_name: Some("web-01".into()),
            datasource_name: Some("CPU".into()),
            instance_name: Some("CPU-0".into()),
            datapoints: Some("CPUBusyPercent".into()),
            ..InstanceDataQuery::default()
        }
        .time_range(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            Utc.timestamp_opt(1_700_003_600, 0).unwrap(),
        );

        let data = client.get_datasource_instance_data(&query).await.unwrap();
        assert_eq!(data["values"][0][0], json!(12.5));

        let sent = client.transport().sent();
        assert_eq!(sent.len(), 5);
        assert_eq!(
            sent[3].request.resource_path,
            "/device/devices/12/devicedatasources/900/instances"
        );
        assert_eq!(sent[3].request.query_value("filter"), Some("name:\"CPU-0\""));

        let data_request = &sent[4].request;
        assert_eq!(
            data_request.resource_path,
            "/device/devices/12/devicedatasources/900/instances/31/data"
        );
        assert_eq!(data_request.query_value("period"), Some("1"));
        assert_eq!(data_request.query_value("start"), Some("1700000000"));
        assert_eq!(data_request.query_value("end"), Some("1700003600"));
        assert_eq!(data_request.query_value("datapoints"), Some("CPUBusyPercent"));
    }

    #[tokio::test]
    async fn instance_data_with_ids_skips_lookups() {
        let transport = ScriptedTransport::new()
            .respond(200, hds_page())
            .respond(200, json!({ "values": [] }));
        let client = LmClient::with_transport(transport);

        let query = InstanceDataQuery {
            device_id: Some(12),
            datasource_id: Some(7),
            instance_id: Some(31),
            period: 5,
            ..InstanceDataQuery::default()
        };
        client.get_datasource_instance_data(&query).await.unwrap();

        let sent = client.transport().sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].request.query_value("period"), Some("5"));
        assert_eq!(sent[1].request.query_value("start"), None);
        assert_eq!(sent[1].request.query_value("datapoints"), None);
    }

    #[tokio::test]
    async fn instance_data_unknown_device_stops_the_chain() {
        let transport = ScriptedTransport::new().respond(200, json!({ "items": [], "total": 0 }));
        let client = LmClient::with_transport(transport);

        let query = InstanceDataQuery {
            device_name: Some("ghost".into()),
            datasource_name: Some("CPU".into()),
            instance_name: Some("CPU-0".into()),
            ..InstanceDataQuery::default()
        };
        let err = client.get_datasource_instance_data(&query).await.unwrap_err();

        assert!(matches!(err, Error::Unresolved { .. }));
        assert!(err.to_string().contains("ghost"));
        assert_eq!(client.transport().paths(), vec!["/device/devices"]);
    }

    #[tokio::test]
    async fn instance_data_unknown_instance_names_it() {
        let transport = ScriptedTransport::new()
            .respond(200, hds_page())
            .respond(200, json!({ "items": [], "total": 0 }));
        let client = LmClient::with_transport(transport);

        let query = InstanceDataQuery {
            device_id: Some(12),
            datasource_id: Some(7),
            instance_name: Some("CPU-9".into()),
            ..InstanceDataQuery::default()
        };
        let err = client.get_datasource_instance_data(&query).await.unwrap_err();
        assert_eq!(err.to_string(), "Instance with name CPU-9 not found");
        assert_eq!(client.transport().sent().len(), 2);
    }

    #[tokio::test]
    async fn instance_data_validates_before_any_call() {
        let client = LmClient::with_transport(ScriptedTransport::new());

        let err = client
            .get_datasource_instance_data(&InstanceDataQuery {
                device_id: Some(12),
                datasource_id: Some(7),
                ..InstanceDataQuery::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter { .. }));

        let err = client
            .get_datasource_instance_data(&InstanceDataQuery {
                datasource_id: Some(7),
                instance_id: Some(31),
                ..InstanceDataQuery::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Either deviceId or deviceName must be provided");
        assert!(client.transport().sent().is_empty());
    }
}
