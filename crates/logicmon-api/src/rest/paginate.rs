// Offset pagination over list endpoints
//
// List endpoints take `size`/`offset` and answer `{items, total}`. The
// total is taken from the first page only. The offset advances by the
// number of items actually received, and an empty page ends the walk
// even when the reported total has not been reached: some endpoints
// report totals they never deliver.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Error;
use crate::filter::Filters;
use crate::rest::client::LmClient;
use crate::transport::{ApiRequest, Transport};

/// Page size used when walking every page (the API maximum).
pub const DEFAULT_FETCH_ALL_SIZE: u32 = 1000;
/// Page size for single-page accessors.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Parameters for [`LmClient::fetch_all_paginated`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginateOptions {
    pub resource_path: String,
    /// Rendered filter string; empty means unfiltered.
    pub filter: String,
    /// Comma-separated field list; empty means all fields.
    pub fields: String,
    pub size: u32,
}

impl PaginateOptions {
    pub fn new(resource_path: impl Into<String>) -> Self {
        Self {
            resource_path: resource_path.into(),
            filter: String::new(),
            fields: String::new(),
            size: DEFAULT_FETCH_ALL_SIZE,
        }
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }
}

impl<T: Transport> LmClient<T> {
    /// Collect every page of a list endpoint, in server order.
    ///
    /// Any failure discards what was collected so far.
    pub async fn fetch_all_paginated<R: DeserializeOwned>(
        &self,
        options: &PaginateOptions,
    ) -> Result<Vec<R>, Error> {
        let mut all = Vec::new();
        let mut offset: i64 = 0;
        let mut total: Option<i64> = None;

        while total.is_none_or(|t| offset < t) {
            let request = ApiRequest::get(options.resource_path.as_str())
                .query("size", options.size)
                .query("offset", offset)
                .query_opt("filter", Some(options.filter.as_str()))
                .query_opt("fields", Some(options.fields.as_str()));

            let page = self.get_page::<R>(&request).await?;
            let reported = *total.get_or_insert(page.total);

            // Progress is only ever made by received items, so an empty
            // page must end the loop.
            if page.items.is_empty() {
                debug!(
                    offset,
                    total = reported,
                    "empty page from {}, stopping", options.resource_path
                );
                break;
            }

            offset = offset.saturating_add(i64::try_from(page.items.len()).unwrap_or(i64::MAX));
            all.extend(page.items);
            debug!(offset, total = reported, "fetched page from {}", options.resource_path);
        }

        Ok(all)
    }

    /// One page of `size`, or every page when `fetch_all` is set (at the
    /// fetch-all page size, ignoring `size`).
    pub(crate) async fn list<R: DeserializeOwned>(
        &self,
        resource_path: &str,
        filters: &Filters,
        fields: Option<&str>,
        fetch_all: bool,
        size: u32,
    ) -> Result<Vec<R>, Error> {
        let filter = filters.build();

        if fetch_all {
            let options = PaginateOptions::new(resource_path)
                .filter(filter)
                .fields(fields.unwrap_or_default());
            return self.fetch_all_paginated(&options).await;
        }

        let request = ApiRequest::get(resource_path)
            .query("size", size)
            .query_opt("filter", Some(filter.as_str()))
            .query_opt("fields", fields);
        Ok(self.get_page::<R>(&request).await?.items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::rest::mock::ScriptedTransport;
    use crate::transport::RawResponse;

    fn items(range: std::ops::Range<u64>) -> Value {
        Value::Array(range.map(|id| json!({ "id": id })).collect())
    }

    fn ids(values: &[Value]) -> Vec<u64> {
        values.iter().map(|v| v["id"].as_u64().unwrap()).collect()
    }

    #[tokio::test]
    async fn collects_pages_in_order() {
        let transport = ScriptedTransport::new()
            .respond(200, json!({ "items": items(0..3), "total": 7 }))
            .respond(200, json!({ "items": items(3..6), "total": 7 }))
            .respond(200, json!({ "items": items(6..7), "total": 7 }));
        let client = LmClient::with_transport(transport);

        let all: Vec<Value> = client
            .fetch_all_paginated(&PaginateOptions::new("/device/devices").size(3))
            .await
            .unwrap();

        assert_eq!(ids(&all), vec![0, 1, 2, 3, 4, 5, 6]);

        let offsets: Vec<String> = client
            .transport()
            .sent()
            .iter()
            .map(|s| s.request.query_value("offset").unwrap().to_owned())
            .collect();
        assert_eq!(offsets, vec!["0", "3", "6"]);
    }

    #[tokio::test]
    async fn empty_page_stops_early() {
        let transport = ScriptedTransport::new()
            .respond(200, json!({ "items": items(0..3), "total": 10 }))
            .respond(200, json!({ "items": [], "total": 10 }));
        let client = LmClient::with_transport(transport);

        let all: Vec<Value> = client
            .fetch_all_paginated(&PaginateOptions::new("/alert/alerts"))
            .await
            .unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(client.transport().sent().len(), 2);
    }

    #[tokio::test]
    async fn total_comes_from_first_page_only() {
        let transport = ScriptedTransport::new()
            .respond(200, json!({ "items": items(0..2), "total": 4 }))
            .respond(200, json!({ "items": items(2..4), "total": 100 }));
        let client = LmClient::with_transport(transport);

        let all: Vec<Value> = client
            .fetch_all_paginated(&PaginateOptions::new("/device/devices").size(2))
            .await
            .unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn missing_or_negative_total_stops_after_first_page() {
        let transport = ScriptedTransport::new()
            .respond(200, json!({ "items": items(0..2) }))
            .respond(200, json!({ "items": items(0..2), "total": -2 }));
        let client = LmClient::with_transport(transport);

        let all: Vec<Value> = client
            .fetch_all_paginated(&PaginateOptions::new("/device/devices"))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let all: Vec<Value> = client
            .fetch_all_paginated(&PaginateOptions::new("/alert/alerts"))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(client.transport().sent().len(), 2);
    }

    #[tokio::test]
    async fn failure_mid_stream_discards_items() {
        let transport = ScriptedTransport::new()
            .respond(200, json!({ "items": items(0..3), "total": 6 }))
            .respond_raw(RawResponse::new(500, "boom"));
        let client = LmClient::with_transport(transport);

        let result: Result<Vec<Value>, Error> = client
            .fetch_all_paginated(&PaginateOptions::new("/device/devices").size(3))
            .await;
        assert_eq!(result.unwrap_err().status(), Some(500));
    }

    #[tokio::test]
    async fn filter_and_fields_only_when_set() {
        let transport = ScriptedTransport::new()
            .respond(200, json!({ "items": [], "total": 0 }))
            .respond(200, json!({ "items": [], "total": 0 }));
        let client = LmClient::with_transport(transport);

        let _: Vec<Value> = client
            .fetch_all_paginated(&PaginateOptions::new("/device/devices"))
            .await
            .unwrap();
        let _: Vec<Value> = client
            .fetch_all_paginated(
                &PaginateOptions::new("/device/devices")
                    .filter("hostStatus:\"normal\"")
                    .fields("id,displayName"),
            )
            .await
            .unwrap();

        let sent = client.transport().sent();
        assert_eq!(sent[0].request.query_value("size"), Some("1000"));
        assert_eq!(sent[0].request.query_value("filter"), None);
        assert_eq!(sent[0].request.query_value("fields"), None);
        assert_eq!(
            sent[1].request.query_value("filter"),
            Some("hostStatus:\"normal\"")
        );
        assert_eq!(sent[1].request.query_value("fields"), Some("id,displayName"));
    }
}
