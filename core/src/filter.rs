//! Filters for the paged collection endpoints.
//!
//! A filter is fixed when a `PagedSequence` is created and re-sent with
//! every page request. Multi-valued filters are comma-joined; URL encoding
//! happens when the client assembles the request URL.

use chrono::NaiveDate;

use crate::classify::SuccessResponse;
use crate::client::XmsClient;
use crate::codec::format_date;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::paging::{Page, PagedQuery};
use crate::types::{GroupResult, MoSms, MtBatchSmsResult};

/// `(name, value)` pairs before URL encoding.
pub type QueryPairs = Vec<(&'static str, String)>;

fn paging_pairs(page: u32, page_size: Option<u32>) -> QueryPairs {
    let mut pairs = vec![("page", page.to_string())];
    if let Some(size) = page_size {
        pairs.push(("page_size", size.to_string()));
    }
    pairs
}

fn push_list(pairs: &mut QueryPairs, key: &'static str, values: &[String]) {
    if !values.is_empty() {
        pairs.push((key, values.join(",")));
    }
}

fn push_date(pairs: &mut QueryPairs, key: &'static str, date: Option<&NaiveDate>) {
    if let Some(date) = date {
        pairs.push((key, format_date(date)));
    }
}

/// Filter for listing batches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchFilter {
    pub page_size: Option<u32>,
    /// Only batches sent from one of these sender addresses.
    pub senders: Vec<String>,
    /// Only batches carrying at least one of these tags.
    pub tags: Vec<String>,
    /// Only batches created on or after this date.
    pub start_date: Option<NaiveDate>,
    /// Only batches created before this date.
    pub end_date: Option<NaiveDate>,
}

impl BatchFilter {
    pub fn query_pairs(&self, page: u32) -> QueryPairs {
        let mut pairs = paging_pairs(page, self.page_size);
        push_list(&mut pairs, "from", &self.senders);
        push_list(&mut pairs, "tags", &self.tags);
        push_date(&mut pairs, "start_date", self.start_date.as_ref());
        push_date(&mut pairs, "end_date", self.end_date.as_ref());
        pairs
    }
}

impl PagedQuery for BatchFilter {
    type Item = MtBatchSmsResult;

    fn build(&self, client: &XmsClient, page: u32) -> HttpRequest {
        client.build_list_batches(self, page)
    }

    fn parse(&self, client: &XmsClient, response: &SuccessResponse) -> Result<Page<Self::Item>, ApiError> {
        client.parse_batches_page(response)
    }
}

/// Filter for listing inbound messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundFilter {
    pub page_size: Option<u32>,
    /// Only messages sent to one of these numbers.
    pub recipients: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl InboundFilter {
    pub fn query_pairs(&self, page: u32) -> QueryPairs {
        let mut pairs = paging_pairs(page, self.page_size);
        push_list(&mut pairs, "to", &self.recipients);
        push_date(&mut pairs, "start_date", self.start_date.as_ref());
        push_date(&mut pairs, "end_date", self.end_date.as_ref());
        pairs
    }
}

impl PagedQuery for InboundFilter {
    type Item = MoSms;

    fn build(&self, client: &XmsClient, page: u32) -> HttpRequest {
        client.build_list_inbounds(self, page)
    }

    fn parse(&self, client: &XmsClient, response: &SuccessResponse) -> Result<Page<Self::Item>, ApiError> {
        client.parse_inbounds_page(response)
    }
}

/// Filter for listing groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFilter {
    pub page_size: Option<u32>,
    pub tags: Vec<String>,
}

impl GroupFilter {
    pub fn query_pairs(&self, page: u32) -> QueryPairs {
        let mut pairs = paging_pairs(page, self.page_size);
        push_list(&mut pairs, "tags", &self.tags);
        pairs
    }
}

impl PagedQuery for GroupFilter {
    type Item = GroupResult;

    fn build(&self, client: &XmsClient, page: u32) -> HttpRequest {
        client.build_list_groups(self, page)
    }

    fn parse(&self, client: &XmsClient, response: &SuccessResponse) -> Result<Page<Self::Item>, ApiError> {
        client.parse_groups_page(response)
    }
}
