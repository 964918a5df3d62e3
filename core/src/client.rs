//! Stateless HTTP request builder and response parser for the XMS API.
//!
//! # Design
//! `XmsClient` holds only the service plan base URL and the credentials and
//! carries no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes a classified `SuccessResponse`. The caller performs the
//! round-trip in between, either by hand followed by `classify`, or through
//! `execute` with a `Transport`.

use url::Url;

use crate::classify::{self, SuccessResponse};
use crate::config::{ClientConfig, ConfigError, Credentials};
use crate::decode::{decode, decode_page, decode_plain};
use crate::encode::{encode, Encode};
use crate::error::ApiError;
use crate::filter::{BatchFilter, GroupFilter, InboundFilter};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportFailure};
use crate::paging::{Page, PageFetcher, PagedSequence};
use crate::types::{
    BatchDeliveryReport, DeliveryReportQuery, GroupCreate, GroupResult, GroupUpdate, MoSms, MtBatchSmsCreate,
    MtBatchSmsResult, MtBatchSmsUpdate, RecipientDeliveryReport, Tags, TagsUpdate,
};

/// Synchronous, stateless client for one XMS service plan.
#[derive(Debug, Clone)]
pub struct XmsClient {
    base: Url,
    credentials: Credentials,
}

impl XmsClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            reason: reason.to_string(),
        };
        let mut base = Url::parse(&config.endpoint).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        base.path_segments_mut()
            .map_err(|_| invalid("endpoint cannot carry a path"))?
            .pop_if_empty()
            .push("v1")
            .push(&config.credentials.service_plan_id);
        base.set_query(None);
        Ok(Self {
            base,
            credentials: config.credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// URL of the service plan, e.g. `https://host/xms/v1/{plan}`.
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    // -----------------------------------------------------------------------
    // Exchange
    // -----------------------------------------------------------------------

    /// Send `request` through `transport` and classify the outcome.
    pub fn execute<T: Transport + ?Sized>(
        &self,
        transport: &T,
        request: &HttpRequest,
    ) -> Result<SuccessResponse, ApiError> {
        tracing::debug!(method = request.method.as_str(), url = %request.path, "sending request");
        self.classify(request, transport.send(request))
    }

    /// Classify an exchange the caller performed itself.
    pub fn classify(
        &self,
        request: &HttpRequest,
        outcome: Result<HttpResponse, TransportFailure>,
    ) -> Result<SuccessResponse, ApiError> {
        classify::classify(request, &self.credentials, outcome)
    }

    // -----------------------------------------------------------------------
    // Batches
    // -----------------------------------------------------------------------

    pub fn build_create_batch(&self, batch: &MtBatchSmsCreate) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, self.url(&["batches"], &[]), batch)
    }

    pub fn build_replace_batch(&self, id: &str, batch: &MtBatchSmsCreate) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, self.url(&["batches", id], &[]), batch)
    }

    pub fn build_update_batch(&self, id: &str, update: &MtBatchSmsUpdate) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, self.url(&["batches", id], &[]), update)
    }

    pub fn build_fetch_batch(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.url(&["batches", id], &[]), None)
    }

    pub fn build_cancel_batch(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, self.url(&["batches", id], &[]), None)
    }

    pub fn build_list_batches(&self, filter: &BatchFilter, page: u32) -> HttpRequest {
        self.request(HttpMethod::Get, self.url(&["batches"], &filter.query_pairs(page)), None)
    }

    /// Parse the batch returned by create, replace, update, fetch and cancel.
    pub fn parse_batch(&self, response: &SuccessResponse) -> Result<MtBatchSmsResult, ApiError> {
        decode(response.body())
    }

    pub fn parse_batches_page(&self, response: &SuccessResponse) -> Result<Page<MtBatchSmsResult>, ApiError> {
        decode_page(response.body())
    }

    /// All batches matching `filter`, fetched page by page through `transport`.
    pub fn batches<'a, T: Transport + ?Sized>(
        &'a self,
        transport: &'a T,
        filter: BatchFilter,
    ) -> PagedSequence<PageFetcher<'a, T, BatchFilter>> {
        PagedSequence::new(PageFetcher::new(self, transport, filter))
    }

    // -----------------------------------------------------------------------
    // Batch tags
    // -----------------------------------------------------------------------
    //
    // `parse_tags` also serves the group tag endpoints.

    pub fn build_fetch_batch_tags(&self, batch_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.url(&["batches", batch_id, "tags"], &[]), None)
    }

    pub fn build_replace_batch_tags(&self, batch_id: &str, tags: &Tags) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, self.url(&["batches", batch_id, "tags"], &[]), tags)
    }

    pub fn build_update_batch_tags(&self, batch_id: &str, update: &TagsUpdate) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, self.url(&["batches", batch_id, "tags"], &[]), update)
    }

    pub fn parse_tags(&self, response: &SuccessResponse) -> Result<Tags, ApiError> {
        decode_plain(response.body())
    }

    // -----------------------------------------------------------------------
    // Delivery reports
    // -----------------------------------------------------------------------

    pub fn build_fetch_delivery_report(&self, batch_id: &str, query: &DeliveryReportQuery) -> HttpRequest {
        let url = self.url(&["batches", batch_id, "delivery_report"], &query.query_pairs());
        self.request(HttpMethod::Get, url, None)
    }

    pub fn parse_delivery_report(&self, response: &SuccessResponse) -> Result<BatchDeliveryReport, ApiError> {
        decode(response.body())
    }

    pub fn build_fetch_recipient_delivery_report(&self, batch_id: &str, recipient: &str) -> HttpRequest {
        let url = self.url(&["batches", batch_id, "delivery_report", recipient], &[]);
        self.request(HttpMethod::Get, url, None)
    }

    pub fn parse_recipient_delivery_report(
        &self,
        response: &SuccessResponse,
    ) -> Result<RecipientDeliveryReport, ApiError> {
        decode(response.body())
    }

    // -----------------------------------------------------------------------
    // Inbounds
    // -----------------------------------------------------------------------

    pub fn build_fetch_inbound(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.url(&["inbounds", id], &[]), None)
    }

    pub fn build_list_inbounds(&self, filter: &InboundFilter, page: u32) -> HttpRequest {
        self.request(HttpMethod::Get, self.url(&["inbounds"], &filter.query_pairs(page)), None)
    }

    pub fn parse_inbound(&self, response: &SuccessResponse) -> Result<MoSms, ApiError> {
        decode(response.body())
    }

    pub fn parse_inbounds_page(&self, response: &SuccessResponse) -> Result<Page<MoSms>, ApiError> {
        decode_page(response.body())
    }

    pub fn inbounds<'a, T: Transport + ?Sized>(
        &'a self,
        transport: &'a T,
        filter: InboundFilter,
    ) -> PagedSequence<PageFetcher<'a, T, InboundFilter>> {
        PagedSequence::new(PageFetcher::new(self, transport, filter))
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    pub fn build_create_group(&self, group: &GroupCreate) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, self.url(&["groups"], &[]), group)
    }

    pub fn build_replace_group(&self, id: &str, group: &GroupCreate) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, self.url(&["groups", id], &[]), group)
    }

    pub fn build_update_group(&self, id: &str, update: &GroupUpdate) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, self.url(&["groups", id], &[]), update)
    }

    pub fn build_fetch_group(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.url(&["groups", id], &[]), None)
    }

    pub fn build_delete_group(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, self.url(&["groups", id], &[]), None)
    }

    pub fn build_fetch_group_members(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.url(&["groups", id, "members"], &[]), None)
    }

    pub fn build_list_groups(&self, filter: &GroupFilter, page: u32) -> HttpRequest {
        self.request(HttpMethod::Get, self.url(&["groups"], &filter.query_pairs(page)), None)
    }

    pub fn build_fetch_group_tags(&self, group_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.url(&["groups", group_id, "tags"], &[]), None)
    }

    pub fn build_replace_group_tags(&self, group_id: &str, tags: &Tags) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, self.url(&["groups", group_id, "tags"], &[]), tags)
    }

    pub fn build_update_group_tags(&self, group_id: &str, update: &TagsUpdate) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, self.url(&["groups", group_id, "tags"], &[]), update)
    }

    pub fn parse_group(&self, response: &SuccessResponse) -> Result<GroupResult, ApiError> {
        decode_plain(response.body())
    }

    pub fn parse_group_members(&self, response: &SuccessResponse) -> Result<Vec<String>, ApiError> {
        decode_plain(response.body())
    }

    pub fn parse_groups_page(&self, response: &SuccessResponse) -> Result<Page<GroupResult>, ApiError> {
        decode_page(response.body())
    }

    pub fn groups<'a, T: Transport + ?Sized>(
        &'a self,
        transport: &'a T,
        filter: GroupFilter,
    ) -> PagedSequence<PageFetcher<'a, T, GroupFilter>> {
        PagedSequence::new(PageFetcher::new(self, transport, filter))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn url(&self, segments: &[&str], query: &[(&'static str, String)]) -> String {
        let mut url = self.base.clone();
        // `new` rejects base URLs without a path, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        url.into()
    }

    fn request(&self, method: HttpMethod, path: String, body: Option<String>) -> HttpRequest {
        let mut headers = vec![
            ("authorization".to_string(), format!("Bearer {}", self.credentials.token)),
            ("accept".to_string(), "application/json".to_string()),
        ];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            path,
            headers,
            body,
        }
    }

    fn json_request<B: Encode + ?Sized>(
        &self,
        method: HttpMethod,
        path: String,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = encode(body)?;
        Ok(self.request(method, path, Some(body)))
    }
}
