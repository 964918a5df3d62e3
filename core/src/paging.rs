//! Lazy, restartable pagination.
//!
//! # Design
//! A `FetchPage` implementation is bound to one logical query and turns a
//! page index into one request. `PagedSequence` wraps it and offers random
//! access through `get` plus forward iteration through `iter`. Every call to
//! `iter` starts a fresh cursor at page 0, so restarting is just iterating
//! again and several cursors over the same query can run side by side.
//!
//! The end of the collection is detected by fetching an empty page rather
//! than by trusting `total_size`, which the service only approximates under
//! concurrent writes. Page 0 is always fetched, so an empty collection yields
//! exactly one empty page.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use crate::classify::SuccessResponse;
use crate::client::XmsClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};

/// One slice of a server-side paged collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Zero-based page index.
    pub page: u32,
    /// Number of entries in `content`.
    pub size: u32,
    /// Total number of entries in the collection, as estimated by the service.
    pub total_size: u64,
    pub content: Vec<T>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

/// Fetches single pages of one fixed query.
pub trait FetchPage {
    type Item;

    fn fetch(&self, page: u32) -> Result<Page<Self::Item>, ApiError>;
}

impl<T, F> FetchPage for F
where
    F: Fn(u32) -> Result<Page<T>, ApiError>,
{
    type Item = T;

    fn fetch(&self, page: u32) -> Result<Page<T>, ApiError> {
        self(page)
    }
}

/// A collection query: filter parameters plus how to build and parse a page.
pub trait PagedQuery {
    type Item;

    fn build(&self, client: &XmsClient, page: u32) -> HttpRequest;

    fn parse(&self, client: &XmsClient, response: &SuccessResponse) -> Result<Page<Self::Item>, ApiError>;
}

/// Binds a query to a client and a transport.
pub struct PageFetcher<'a, T: ?Sized, Q> {
    client: &'a XmsClient,
    transport: &'a T,
    query: Q,
}

impl<'a, T: Transport + ?Sized, Q: PagedQuery> PageFetcher<'a, T, Q> {
    pub fn new(client: &'a XmsClient, transport: &'a T, query: Q) -> Self {
        Self {
            client,
            transport,
            query,
        }
    }

    pub fn query(&self) -> &Q {
        &self.query
    }
}

impl<T: Transport + ?Sized, Q: PagedQuery> FetchPage for PageFetcher<'_, T, Q> {
    type Item = Q::Item;

    fn fetch(&self, page: u32) -> Result<Page<Q::Item>, ApiError> {
        let request = self.query.build(self.client, page);
        let response = self.client.execute(self.transport, &request)?;
        self.query.parse(self.client, &response)
    }
}

/// A lazily fetched sequence of pages.
#[derive(Debug, Clone)]
pub struct PagedSequence<F> {
    fetcher: F,
}

impl<F: FetchPage> PagedSequence<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Fetch page `page` directly. Nothing is cached; calling this twice
    /// issues two requests.
    pub fn get(&self, page: u32) -> Result<Page<F::Item>, ApiError> {
        self.fetcher.fetch(page)
    }

    /// A fresh cursor positioned at page 0.
    pub fn iter(&self) -> Pages<'_, F> {
        Pages {
            fetcher: &self.fetcher,
            position: 0,
            previous_nonempty: false,
            finished: false,
        }
    }

    /// Iterate over individual entries across pages.
    pub fn items(&self) -> Items<'_, F> {
        Items {
            pages: self.iter(),
            buffer: VecDeque::new(),
        }
    }

    pub fn into_inner(self) -> F {
        self.fetcher
    }
}

impl<'a, F: FetchPage> IntoIterator for &'a PagedSequence<F> {
    type Item = Result<Page<F::Item>, ApiError>;
    type IntoIter = Pages<'a, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Forward cursor over the pages of a `PagedSequence`.
///
/// Stops after the first empty page past page 0, or after the first error.
pub struct Pages<'a, F> {
    fetcher: &'a F,
    position: u32,
    previous_nonempty: bool,
    finished: bool,
}

impl<F> Pages<'_, F> {
    /// Index of the page the next call to `next` fetches.
    pub fn position(&self) -> u32 {
        self.position
    }

    fn has_next(&self) -> bool {
        !self.finished && (self.position == 0 || self.previous_nonempty)
    }
}

impl<F: FetchPage> Iterator for Pages<'_, F> {
    type Item = Result<Page<F::Item>, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        match self.fetcher.fetch(self.position) {
            Ok(page) => {
                tracing::debug!(page = self.position, size = page.size, "fetched page");
                self.previous_nonempty = !page.is_empty();
                match self.position.checked_add(1) {
                    Some(next) => self.position = next,
                    None => self.finished = true,
                }
                Some(Ok(page))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<F: FetchPage> FusedIterator for Pages<'_, F> {}

/// Flattened view of a `PagedSequence`, one entry at a time.
pub struct Items<'a, F: FetchPage> {
    pages: Pages<'a, F>,
    buffer: VecDeque<F::Item>,
}

impl<F: FetchPage> Iterator for Items<'_, F> {
    type Item = Result<F::Item, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            match self.pages.next()? {
                Ok(page) => self.buffer.extend(page.content),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Serves pages whose sizes are given by `sizes`; pages past the end are
    /// empty. Records every requested index.
    struct Scripted {
        sizes: Vec<u32>,
        calls: RefCell<Vec<u32>>,
        fail_at: Option<u32>,
    }

    impl Scripted {
        fn new(sizes: &[u32]) -> Self {
            Self {
                sizes: sizes.to_vec(),
                calls: RefCell::new(Vec::new()),
                fail_at: None,
            }
        }
    }

    impl FetchPage for Scripted {
        type Item = String;

        fn fetch(&self, page: u32) -> Result<Page<String>, ApiError> {
            self.calls.borrow_mut().push(page);
            if self.fail_at == Some(page) {
                return Err(ApiError::NotFound {
                    url: format!("page/{page}"),
                });
            }
            let size = self.sizes.get(page as usize).copied().unwrap_or(0);
            Ok(Page {
                page,
                size,
                total_size: self.sizes.iter().map(|s| *s as u64).sum(),
                content: (0..size).map(|i| format!("{page}-{i}")).collect(),
            })
        }
    }

    #[test]
    fn stops_after_first_empty_page() {
        let seq = PagedSequence::new(Scripted::new(&[2, 1, 0]));
        let pages: Vec<u32> = seq.iter().map(|p| p.unwrap().page).collect();
        assert_eq!(pages, [0, 1, 2]);
        assert_eq!(*seq.fetcher.calls.borrow(), [0, 1, 2]);
    }

    #[test]
    fn empty_collection_yields_one_empty_page() {
        let seq = PagedSequence::new(Scripted::new(&[0]));
        let pages: Vec<Page<String>> = seq.iter().map(Result::unwrap).collect();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn ignores_total_size_bookkeeping() {
        // total_size says 3 but a fourth entry appears on page 2.
        let seq = PagedSequence::new(|page: u32| -> Result<Page<u32>, ApiError> {
            let content = match page {
                0 => vec![1, 2],
                1 => vec![3],
                2 => vec![4],
                _ => Vec::new(),
            };
            Ok(Page {
                page,
                size: content.len() as u32,
                total_size: 3,
                content,
            })
        });
        let items: Vec<u32> = seq.items().map(Result::unwrap).collect();
        assert_eq!(items, [1, 2, 3, 4]);
    }

    #[test]
    fn cursor_ends_at_the_last_page_index() {
        let seq = PagedSequence::new(|page: u32| -> Result<Page<u32>, ApiError> {
            Ok(Page {
                page,
                size: 1,
                total_size: u64::MAX,
                content: vec![page],
            })
        });
        let cursor = Pages {
            fetcher: &seq.fetcher,
            position: u32::MAX - 1,
            previous_nonempty: true,
            finished: false,
        };
        let pages: Vec<u32> = cursor.map(|p| p.unwrap().page).collect();
        assert_eq!(pages, [u32::MAX - 1, u32::MAX]);
    }

    #[test]
    fn iteration_restarts_from_page_zero() {
        let seq = PagedSequence::new(Scripted::new(&[1, 0]));
        assert_eq!(seq.iter().count(), 2);
        assert_eq!(seq.iter().count(), 2);
        assert_eq!(*seq.fetcher.calls.borrow(), [0, 1, 0, 1]);
    }

    #[test]
    fn independent_cursors_do_not_interfere() {
        let seq = PagedSequence::new(Scripted::new(&[1, 1, 0]));
        let mut a = seq.iter();
        let mut b = seq.iter();
        assert_eq!(a.next().unwrap().unwrap().page, 0);
        assert_eq!(a.next().unwrap().unwrap().page, 1);
        assert_eq!(b.next().unwrap().unwrap().page, 0);
        assert_eq!(a.position(), 2);
        assert_eq!(b.position(), 1);
    }

    #[test]
    fn get_refetches_every_time() {
        let seq = PagedSequence::new(Scripted::new(&[3, 2]));
        assert_eq!(seq.get(1).unwrap().size, 2);
        assert_eq!(seq.get(1).unwrap().size, 2);
        assert_eq!(seq.get(7).unwrap().size, 0);
        assert_eq!(*seq.fetcher.calls.borrow(), [1, 1, 7]);
    }

    #[test]
    fn error_ends_iteration() {
        let mut fetcher = Scripted::new(&[1, 1, 1, 0]);
        fetcher.fail_at = Some(1);
        let seq = PagedSequence::new(fetcher);
        let mut pages = seq.iter();
        assert!(pages.next().unwrap().is_ok());
        assert!(matches!(pages.next(), Some(Err(ApiError::NotFound { .. }))));
        assert!(pages.next().is_none());
        assert!(pages.next().is_none());
    }

    #[test]
    fn items_flatten_in_wire_order() {
        let seq = PagedSequence::new(Scripted::new(&[2, 1, 0]));
        let items: Vec<String> = seq.items().map(Result::unwrap).collect();
        assert_eq!(items, ["0-0", "0-1", "1-0"]);
    }
}
