// logicmon-api: Async Rust client for the LogicMonitor REST API
//
// Layering, leaves first: `transport` performs one authenticated HTTP
// exchange, `rest::LmClient` adds the CSRF pre-flight and status mapping,
// pagination and name→ID resolution, and the entity accessors sit on top.

pub mod auth;
pub mod error;
pub mod filter;
pub mod models;
pub mod rest;
pub mod transport;

pub use auth::Credentials;
pub use error::Error;
pub use filter::{Filters, build_filter};
pub use models::{Alert, Datasource, Device, DeviceDatasource, Instance, Page};
pub use rest::{
    AlertListOptions, DatasourceLookup, DeviceAlertOptions, DeviceDatasourceLookup,
    DeviceListOptions, DeviceLookup, GroupAlertOptions, InstanceDataQuery, InstanceListOptions,
    LmClient, PaginateOptions,
};
pub use transport::{
    ApiRequest, HttpTransport, HttpVerb, RawResponse, TlsMode, Transport, TransportConfig,
    normalize_base_url,
};
