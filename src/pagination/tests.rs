//! Tests for pagination module

use super::*;
use crate::partition::Query;
use crate::source::testing::{ids, token_for, ScriptedSource};
use crate::source::{ItemRef, Page, PageRequest, SearchSource};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn page_of(ids: &[String]) -> Page {
    Page::new(ids.iter().map(ItemRef::new).collect())
}

async fn walk(source: &ScriptedSource, query: &Query, budget: u32) -> LeafResult {
    let request = PageRequest::first(query.clone(), 20, vec!["summaries".to_string()]);
    let first = source.fetch_page(&request).await.unwrap();
    LeafPaginator::new(source, budget)
        .paginate(&request, first)
        .await
        .unwrap()
}

// ============================================================================
// NextPage / PaginationState Tests
// ============================================================================

#[test]
fn test_next_page_predicates() {
    let next = NextPage::Continue {
        token: "t1".to_string(),
    };
    assert!(next.is_continue());
    assert!(!next.is_done());

    let done = NextPage::Done(LeafStop::Exhausted);
    assert!(done.is_done());
    assert!(!done.is_continue());
}

#[test]
fn test_pagination_state_default() {
    let state = PaginationState::new();
    assert_eq!(state.pages, 0);
    assert_eq!(state.total_fetched, 0);
    assert!(state.cursor.is_none());
    assert!(state.seen_tokens.is_empty());
    assert!(!state.done);
}

#[test]
fn test_pagination_state_follows_token() {
    let mut state = PaginationState::new();
    let page = page_of(&ids("A", 0..20)).with_next_token("t1");

    let next = state.record_page(&page, 50);

    assert_eq!(
        next,
        NextPage::Continue {
            token: "t1".to_string()
        }
    );
    assert_eq!(state.pages, 1);
    assert_eq!(state.total_fetched, 20);
    assert_eq!(state.cursor.as_deref(), Some("t1"));
    assert!(!state.done);
}

#[test]
fn test_pagination_state_done_without_token() {
    let mut state = PaginationState::new();
    let next = state.record_page(&page_of(&ids("A", 0..5)), 50);

    assert_eq!(next, NextPage::Done(LeafStop::Exhausted));
    assert!(state.done);
    assert!(state.cursor.is_none());
}

#[test]
fn test_pagination_state_repeated_token() {
    let mut state = PaginationState::new();
    let page = page_of(&ids("A", 0..20)).with_next_token("t1");

    assert!(state.record_page(&page, 50).is_continue());
    assert_eq!(
        state.record_page(&page, 50),
        NextPage::Done(LeafStop::RepeatedToken {
            token: "t1".to_string()
        })
    );
}

#[test]
fn test_pagination_state_budget() {
    let mut state = PaginationState::new();
    let page = page_of(&ids("A", 0..20)).with_next_token("t1");

    assert_eq!(
        state.record_page(&page, 1),
        NextPage::Done(LeafStop::CeilingReached {
            next_token: "t1".to_string()
        })
    );
}

#[test_case(1000, 20, 50)]
#[test_case(1000, 30, 34 ; "rounds up")]
#[test_case(10, 20, 1 ; "ceiling below page size")]
#[test_case(0, 20, 1 ; "never below one page")]
#[test_case(1000, 0, 1000 ; "zero page size treated as one")]
fn test_page_budget(ceiling: u64, page_size: u32, expected: u32) {
    assert_eq!(page_budget(ceiling, page_size), expected);
}

#[test]
fn test_leaf_stop_classification() {
    assert!(LeafStop::Exhausted.is_complete());
    assert!(!LeafStop::Failed {
        error: "boom".to_string()
    }
    .is_complete());
    assert!(LeafStop::RepeatedToken {
        token: "t".to_string()
    }
    .is_anomaly());
    assert!(!LeafStop::CeilingReached {
        next_token: "t".to_string()
    }
    .is_anomaly());
}

// ============================================================================
// LeafPaginator Tests
// ============================================================================

#[tokio::test]
async fn test_leaf_two_pages() {
    let query = Query::new(["usb"]);
    let source = ScriptedSource::new().leaf(&query, &ids("A", 0..25), 20, Some(25), vec![]);

    let result = walk(&source, &query, 50).await;

    assert_eq!(result.items.len(), 25);
    assert_eq!(result.pages, 2);
    assert_eq!(result.requests, 2);
    assert_eq!(result.stop, LeafStop::Exhausted);
    assert_eq!(source.calls(), 2);

    let requests = source.requests();
    assert_eq!(requests[0].page_token, None);
    assert_eq!(requests[1].page_token, Some(token_for(&query, 1)));
    assert_eq!(requests[1].included_data, vec!["summaries".to_string()]);
}

#[tokio::test]
async fn test_leaf_empty_result() {
    let query = Query::new(["nothing"]);
    let source = ScriptedSource::new().leaf(&query, &[], 20, Some(0), vec![]);

    let result = walk(&source, &query, 50).await;

    assert!(result.items.is_empty());
    assert_eq!(result.requests, 1);
    assert_eq!(result.stop, LeafStop::Exhausted);
}

#[tokio::test]
async fn test_leaf_repeated_token_stops_after_second_occurrence() {
    let query = Query::new(["loop"]);
    let source = ScriptedSource::new()
        .page(&query, None, page_of(&ids("A", 0..20)).with_next_token("t1"))
        .page(
            &query,
            Some("t1"),
            page_of(&ids("A", 20..40)).with_next_token("t1"),
        );

    let result = walk(&source, &query, 50).await;

    assert_eq!(source.calls(), 2);
    assert_eq!(result.items.len(), 40);
    assert_eq!(
        result.stop,
        LeafStop::RepeatedToken {
            token: "t1".to_string()
        }
    );
}

#[tokio::test]
async fn test_leaf_stops_at_budget() {
    let query = Query::new(["big"]);
    let source = ScriptedSource::new().leaf(&query, &ids("A", 0..100), 20, Some(100), vec![]);

    let result = walk(&source, &query, 3).await;

    assert_eq!(result.items.len(), 60);
    assert_eq!(result.pages, 3);
    assert_eq!(source.calls(), 3);
    assert_eq!(
        result.stop,
        LeafStop::CeilingReached {
            next_token: token_for(&query, 3)
        }
    );
}

#[tokio::test]
async fn test_leaf_transient_failure_keeps_partial_items() {
    let query = Query::new(["flaky"]);
    let source = ScriptedSource::new()
        .page(&query, None, page_of(&ids("A", 0..20)).with_next_token("t1"))
        .failure(&query, Some("t1"), 503);

    let result = walk(&source, &query, 50).await;

    assert_eq!(result.items.len(), 20);
    assert_eq!(result.pages, 1);
    assert_eq!(result.requests, 2);
    assert!(matches!(result.stop, LeafStop::Failed { ref error } if error.contains("503")));
}

#[tokio::test]
async fn test_leaf_fatal_failure_is_error() {
    let query = Query::new(["denied"]);
    let source = ScriptedSource::new()
        .page(&query, None, page_of(&ids("A", 0..20)).with_next_token("t1"))
        .fatal(&query, Some("t1"));

    let request = PageRequest::first(query.clone(), 20, vec![]);
    let first = source.fetch_page(&request).await.unwrap();
    let err = LeafPaginator::new(&source, 50)
        .paginate(&request, first)
        .await
        .unwrap_err();

    assert!(err.is_fatal());
}
