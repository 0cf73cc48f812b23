// REST API surface for LogicMonitor.
//
// `client` owns request execution; the endpoint modules add inherent
// methods on `LmClient` grouped by resource.

pub mod alerts;
pub mod client;
pub mod datasources;
pub mod devices;
pub mod instances;
pub mod paginate;

#[cfg(test)]
pub(crate) mod mock;

pub use alerts::{AlertListOptions, DeviceAlertOptions, GroupAlertOptions};
pub use client::LmClient;
pub use datasources::{DatasourceLookup, DeviceDatasourceLookup};
pub use devices::{DeviceListOptions, DeviceLookup};
pub use instances::{InstanceDataQuery, InstanceListOptions};
pub use paginate::PaginateOptions;
