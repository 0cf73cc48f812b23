// Device endpoints
//
// Lookup by id swallows a 404 into `None`. Lookup by name is an exact
// `displayName` match and returns the first hit.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::Error;
use crate::filter::Filters;
use crate::models::{Device, Page};
use crate::rest::client::LmClient;
use crate::rest::paginate::DEFAULT_PAGE_SIZE;
use crate::transport::{ApiRequest, Transport};

const DEVICES_PATH: &str = "/device/devices";

/// Identifies one device by id or by display name. Id wins when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceLookup {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub fields: Option<String>,
}

impl DeviceLookup {
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

/// Parameters for [`LmClient::get_devices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceListOptions {
    pub filters: Filters,
    pub fields: Option<String>,
    pub fetch_all: bool,
    /// Page size when `fetch_all` is off.
    pub size: u32,
}

impl Default for DeviceListOptions {
    fn default() -> Self {
        Self {
            filters: Filters::new(),
            fields: None,
            fetch_all: false,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Treat an empty string the same as a missing one.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Entity ids start at 1; an id of 0 counts as missing.
pub(crate) fn non_zero(id: Option<u64>) -> Option<u64> {
    id.filter(|&id| id != 0)
}

impl<T: Transport> LmClient<T> {
    /// Fetch one device by id or display name.
    ///
    /// `Ok(None)` when the id is unknown (404) or no device has that name.
    pub async fn get_device(&self, lookup: &DeviceLookup) -> Result<Option<Device>, Error> {
        let fields = lookup.fields.as_deref();

        if let Some(id) = non_zero(lookup.id) {
            return self
                .fetch_by_id(&format!("{DEVICES_PATH}/{id}"), fields, "Device", id)
                .await;
        }

        let Some(name) = non_empty(lookup.name.as_deref()) else {
            return Err(Error::missing("Either id or name must be provided"));
        };

        let filter = Filters::new().with("displayName", name);
        self.first_match(DEVICES_PATH, &filter, fields).await
    }

    /// List devices matching `options.filters`.
    pub async fn get_devices(&self, options: &DeviceListOptions) -> Result<Vec<Device>, Error> {
        self.list(
            DEVICES_PATH,
            &options.filters,
            options.fields.as_deref(),
            options.fetch_all,
            options.size,
        )
        .await
    }

    /// Resolve a device id that a later step depends on.
    ///
    /// An unknown name is a hard error here, unlike in [`get_device`](Self::get_device).
    pub(crate) async fn resolve_device_id(
        &self,
        id: Option<u64>,
        name: Option<&str>,
    ) -> Result<u64, Error> {
        if let Some(id) = non_zero(id) {
            return Ok(id);
        }
        let Some(name) = non_empty(name) else {
            return Err(Error::missing("Either deviceId or deviceName must be provided"));
        };

        debug!(name, "resolving device");
        match self.get_device(&DeviceLookup::by_name(name)).await? {
            Some(device) => Ok(device.id),
            None => Err(Error::unresolved(format!("Device with name {name} not found"))),
        }
    }

    // ── Shared lookup helpers ────────────────────────────────────────

    /// GET a single entity; a 404 becomes `None`.
    pub(crate) async fn fetch_by_id<R: DeserializeOwned>(
        &self,
        path: &str,
        fields: Option<&str>,
        entity: &str,
        id: u64,
    ) -> Result<Option<R>, Error> {
        let request = ApiRequest::get(path).query_opt("fields", fields);
        match self.request(&request).await {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.is_not_found() => {
                warn!("{entity} with ID {id} not found: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// First item of a `size=1` filtered list query.
    pub(crate) async fn first_match<R: DeserializeOwned>(
        &self,
        path: &str,
        filter: &Filters,
        fields: Option<&str>,
    ) -> Result<Option<R>, Error> {
        let request = ApiRequest::get(path)
            .query("filter", filter.build())
            .query("size", 1)
            .query_opt("fields", fields);
        let page: Page<R> = self.get_page(&request).await?;
        Ok(page.items.into_iter().next())
    }
}
