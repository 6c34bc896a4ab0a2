//! Scripted in-memory source for tests

use super::types::{FacetBreakdown, ItemRef, Page, PageRequest, SearchSource};
use crate::error::{Error, Result};
use crate::partition::Query;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Scripted {
    Page(Page),
    Status(u16),
    Fatal,
}

type Key = (String, Option<String>);

/// Serves pre-recorded pages keyed by query and page token.
///
/// Unscripted requests panic so a test never silently reads an empty page.
#[derive(Debug, Default)]
pub(crate) struct ScriptedSource {
    responses: HashMap<Key, Scripted>,
    max_page_size: Option<u32>,
    hierarchical: HashSet<String>,
    calls: AtomicUsize,
    log: Mutex<Vec<PageRequest>>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = Some(size);
        self
    }

    pub(crate) fn with_hierarchical(mut self, facet: &str) -> Self {
        self.hierarchical.insert(facet.to_string());
        self
    }

    /// Script one page
    pub(crate) fn page(mut self, query: &Query, token: Option<&str>, page: Page) -> Self {
        self.responses
            .insert(key(query, token), Scripted::Page(page));
        self
    }

    /// Script a non-fatal HTTP failure
    pub(crate) fn failure(mut self, query: &Query, token: Option<&str>, status: u16) -> Self {
        self.responses
            .insert(key(query, token), Scripted::Status(status));
        self
    }

    /// Script an authentication failure
    pub(crate) fn fatal(mut self, query: &Query, token: Option<&str>) -> Self {
        self.responses.insert(key(query, token), Scripted::Fatal);
        self
    }

    /// Script a complete leaf: `ids` split into pages of `page_size`, chained
    /// by tokens. The first page carries `total` and `refinements`.
    pub(crate) fn leaf(
        mut self,
        query: &Query,
        ids: &[String],
        page_size: usize,
        total: Option<u64>,
        refinements: Vec<FacetBreakdown>,
    ) -> Self {
        let chunks: Vec<&[String]> = if ids.is_empty() {
            vec![ids]
        } else {
            ids.chunks(page_size.max(1)).collect()
        };
        let last = chunks.len() - 1;

        for (n, chunk) in chunks.into_iter().enumerate() {
            let mut page = Page::new(chunk.iter().map(ItemRef::new).collect());
            if n < last {
                page.next_token = Some(token_for(query, n + 1));
            }
            if n == 0 {
                page.total = total;
                page.refinements = refinements.clone();
            }
            let token = (n > 0).then(|| token_for(query, n));
            self = self.page(query, token.as_deref(), page);
        }
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<PageRequest> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

/// Token the scripted leaf uses for page `n` (0-based) of `query`
pub(crate) fn token_for(query: &Query, n: usize) -> String {
    format!("{}#{n}", query.key())
}

/// Identifiers `{prefix}-0000` and up
pub(crate) fn ids(prefix: &str, range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|n| format!("{prefix}-{n:04}")).collect()
}

fn key(query: &Query, token: Option<&str>) -> Key {
    (query.key(), token.map(str::to_string))
}

#[async_trait]
impl SearchSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn max_page_size(&self) -> u32 {
        self.max_page_size.unwrap_or(u32::MAX)
    }

    fn is_hierarchical(&self, facet: &str) -> bool {
        self.hierarchical.contains(facet)
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.log.lock() {
            log.push(request.clone());
        }

        let k = key(&request.query, request.page_token.as_deref());
        match self.responses.get(&k) {
            Some(Scripted::Page(page)) => Ok(page.clone()),
            Some(Scripted::Status(status)) => Err(Error::http_status(*status, "scripted failure")),
            Some(Scripted::Fatal) => Err(Error::auth("scripted credentials rejected")),
            None => panic!("unscripted request: {k:?}"),
        }
    }
}
