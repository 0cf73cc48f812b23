// Datasource endpoints
//
// Datasource definitions live under `/setting/datasources`. A datasource
// applied to a device is a separate entity (the hds) whose id scopes every
// instance query.

use tracing::{debug, warn};

use crate::error::Error;
use crate::filter::Filters;
use crate::models::{Datasource, DeviceDatasource};
use crate::rest::client::LmClient;
use crate::rest::devices::{non_empty, non_zero};
use crate::transport::Transport;

const DATASOURCES_PATH: &str = "/setting/datasources";

fn device_datasources_path(device_id: u64) -> String {
    format!("/device/devices/{device_id}/devicedatasources")
}

/// Identifies one datasource by id or by name. Id wins when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasourceLookup {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub fields: Option<String>,
}

impl DatasourceLookup {
    pub fn by_id(id: u64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }
}

/// Identifies the association of a datasource with a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDatasourceLookup {
    /// Required.
    pub device_id: Option<u64>,
    pub datasource_id: Option<u64>,
    pub datasource_name: Option<String>,
}

impl DeviceDatasourceLookup {
    pub fn new(device_id: u64) -> Self {
        Self {
            device_id: Some(device_id),
            ..Self::default()
        }
    }

    pub fn datasource_id(mut self, id: u64) -> Self {
        self.datasource_id = Some(id);
        self
    }

    pub fn datasource_name(mut self, name: impl Into<String>) -> Self {
        self.datasource_name = Some(name.into());
        self
    }
}

impl<T: Transport> LmClient<T> {
    /// Fetch one datasource definition by id or name.
    ///
    /// `Ok(None)` when the id is unknown (404) or nothing has that name.
    pub async fn get_datasource(
        &self,
        lookup: &DatasourceLookup,
    ) -> Result<Option<Datasource>, Error> {
        let fields = lookup.fields.as_deref();

        if let Some(id) = non_zero(lookup.id) {
            return self
                .fetch_by_id(&format!("{DATASOURCES_PATH}/{id}"), fields, "Datasource", id)
                .await;
        }

        let Some(name) = non_empty(lookup.name.as_deref()) else {
            return Err(Error::missing("Either id or name must be provided"));
        };

        let filter = Filters::new().with("name", name);
        self.first_match(DATASOURCES_PATH, &filter, fields).await
    }

    /// Find the association of a datasource with a device.
    ///
    /// A datasource name that does not resolve yields `Ok(None)`, as does a
    /// device that does not have the datasource applied.
    pub async fn get_device_datasource(
        &self,
        lookup: &DeviceDatasourceLookup,
    ) -> Result<Option<DeviceDatasource>, Error> {
        let Some(device_id) = non_zero(lookup.device_id) else {
            return Err(Error::missing("deviceId is required"));
        };

        let datasource_name = non_empty(lookup.datasource_name.as_deref());
        let datasource_id = match (non_zero(lookup.datasource_id), datasource_name) {
            (Some(id), _) => id,
            (None, Some(name)) => {
                match self.get_datasource(&DatasourceLookup::by_name(name)).await? {
                    Some(datasource) => datasource.id,
                    None => {
                        warn!("Datasource with name {name} not found");
                        return Ok(None);
                    }
                }
            }
            (None, None) => {
                return Err(Error::missing(
                    "Either datasourceId or datasourceName must be provided",
                ));
            }
        };

        let filter = Filters::new().with("dataSourceId", datasource_id);
        self.first_match(&device_datasources_path(device_id), &filter, None)
            .await
    }

    /// Resolve the association a later step depends on; not found is a
    /// hard error.
    pub(crate) async fn resolve_device_datasource(
        &self,
        device_id: u64,
        datasource_id: Option<u64>,
        datasource_name: Option<&str>,
    ) -> Result<DeviceDatasource, Error> {
        let lookup = DeviceDatasourceLookup {
            device_id: Some(device_id),
            datasource_id,
            datasource_name: datasource_name.map(str::to_owned),
        };

        debug!(device_id, ?datasource_id, ?datasource_name, "resolving device datasource");
        match self.get_device_datasource(&lookup).await? {
            Some(hds) => Ok(hds),
            None => {
                let datasource = match (datasource_id, datasource_name) {
                    (Some(id), _) => id.to_string(),
                    (None, Some(name)) => name.to_owned(),
                    (None, None) => String::new(),
                };
                Err(Error::unresolved(format!(
                    "Datasource {datasource} not found on device {device_id}"
                )))
            }
        }
    }
}
