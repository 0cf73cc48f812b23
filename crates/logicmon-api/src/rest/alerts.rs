// Alert endpoints
//
// Device and group alert accessors are `get_alerts` with one scoping
// criterion placed first. Caller criteria are merged over it, so a caller
// can override the scope key itself.

use tracing::debug;

use crate::error::Error;
use crate::filter::Filters;
use crate::models::Alert;
use crate::rest::client::LmClient;
use crate::rest::devices::{non_empty, non_zero};
use crate::rest::paginate::DEFAULT_PAGE_SIZE;
use crate::transport::Transport;

const ALERTS_PATH: &str = "/alert/alerts";

/// Parameters for [`LmClient::get_alerts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertListOptions {
    pub filters: Filters,
    pub fields: Option<String>,
    pub fetch_all: bool,
    pub size: u32,
}

impl Default for AlertListOptions {
    fn default() -> Self {
        Self {
            filters: Filters::new(),
            fields: None,
            fetch_all: false,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Parameters for [`LmClient::get_device_alerts`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceAlertOptions {
    pub device_id: Option<u64>,
    pub device_name: Option<String>,
    pub additional_filters: Filters,
    pub fields: Option<String>,
    pub fetch_all: bool,
}

/// Parameters for [`LmClient::get_group_alerts`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupAlertOptions {
    /// Required.
    pub group_id: Option<u64>,
    pub additional_filters: Filters,
    pub fields: Option<String>,
    pub fetch_all: bool,
}

impl<T: Transport> LmClient<T> {
    pub async fn get_alerts(&self, options: &AlertListOptions) -> Result<Vec<Alert>, Error> {
        self.list(
            ALERTS_PATH,
            &options.filters,
            options.fields.as_deref(),
            options.fetch_all,
            options.size,
        )
        .await
    }

    /// Alerts raised on one device.
    pub async fn get_device_alerts(
        &self,
        options: &DeviceAlertOptions,
    ) -> Result<Vec<Alert>, Error> {
        if non_zero(options.device_id).is_none()
            && non_empty(options.device_name.as_deref()).is_none()
        {
            return Err(Error::missing(
                "Either deviceId or deviceName must be provided",
            ));
        }
        let device_id = self
            .resolve_device_id(options.device_id, options.device_name.as_deref())
            .await?;

        let filters = Filters::new()
            .with("resourceId", device_id)
            .merge(&options.additional_filters);
        debug!(device_id, "fetching device alerts");

        self.get_alerts(&AlertListOptions {
            filters,
            fields: options.fields.clone(),
            fetch_all: options.fetch_all,
            ..AlertListOptions::default()
        })
        .await
    }

    /// Alerts raised on any device in a group.
    pub async fn get_group_alerts(
        &self,
        options: &GroupAlertOptions,
    ) -> Result<Vec<Alert>, Error> {
        let Some(group_id) = non_zero(options.group_id) else {
            return Err(Error::missing("groupId is required"));
        };

        let filters = Filters::new()
            .with("resourceGroupId", group_id)
            .merge(&options.additional_filters);
        debug!(group_id, "fetching group alerts");

        self.get_alerts(&AlertListOptions {
            filters,
            fields: options.fields.clone(),
            fetch_all: options.fetch_all,
            ..AlertListOptions::default()
        })
        .await
    }
}
