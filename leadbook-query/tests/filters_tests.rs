use leadbook_query::{
    DEFAULT_DEBOUNCE, DEFAULT_PAGE_SIZE, Debouncer, FilterState, ListParams, query_key,
};
use leadbook_types::{ClientFilters, ClientStatus, LeadFilters, LeadPriority, LeadStatus};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::time::Duration;

fn leads() -> FilterState<LeadFilters> {
    FilterState::new(query_key!["leads"], LeadFilters::default())
}

// ── Paging ──────────────────────────────────────────────────────

#[test]
fn starts_on_first_page() {
    let state = leads();
    assert_eq!(state.page(), 1);
    assert_eq!(state.limit(), DEFAULT_PAGE_SIZE);
    assert_eq!(state.revision(), 0);
    assert_eq!(
        state.query_key(),
        &query_key!["leads", json!({"page": 1, "limit": 10})]
    );
}

#[test]
fn page_navigation_is_clamped() {
    let mut state = leads();
    state.go_to_page(-5);
    assert_eq!(state.page(), 1);
    state.go_to_page(0);
    assert_eq!(state.page(), 1);
    state.prev_page();
    assert_eq!(state.page(), 1);

    state.go_to_page(4);
    state.next_page();
    assert_eq!(state.page(), 5);
    state.prev_page();
    assert_eq!(state.page(), 4);
}

#[test]
fn changing_limit_returns_to_first_page() {
    let mut state = leads();
    state.go_to_page(3);
    state.change_limit(25);
    assert_eq!((state.page(), state.limit()), (1, 25));

    state.change_limit(0);
    assert_eq!(state.limit(), 1);
}

// ── Filters ─────────────────────────────────────────────────────

#[test]
fn filter_changes_reset_the_page() {
    let mut state = leads();
    state.go_to_page(3);
    state.update_filter(|f| f.status = Some(LeadStatus::New));
    assert_eq!(state.page(), 1);
    assert_eq!(state.filters().status, Some(LeadStatus::New));

    state.go_to_page(2);
    state.update_filters(LeadFilters {
        priority: Some(LeadPriority::High),
        ..Default::default()
    });
    assert_eq!(state.page(), 1);
    assert_eq!(state.filters().status, Some(LeadStatus::New), "merge keeps other fields");
    assert_eq!(state.filters().priority, Some(LeadPriority::High));
}

#[test]
fn clearing_filters() {
    let initial = ClientFilters {
        status: Some(ClientStatus::Active),
        ..Default::default()
    };
    let mut state = FilterState::new(query_key!["clients"], initial.clone());
    state.update_filter(|f| f.search = Some("acme".into()));

    state.go_to_page(2);
    state.clear_filter("search");
    assert_eq!(state.filters().search, None);
    assert_eq!(state.page(), 1);

    state.update_filter(|f| f.status = Some(ClientStatus::Churned));
    state.clear_filters();
    assert_eq!(state.filters(), &initial);
}

#[test]
fn params_flatten_filters_with_paging() {
    let mut state = leads();
    state.update_filter(|f| f.assigned_to = Some("u1".into()));
    state.go_to_page(2);

    assert_eq!(
        serde_json::to_value(state.params()).unwrap(),
        json!({"assignedTo": "u1", "page": 2, "limit": 10})
    );
    assert_eq!(
        state.query_key(),
        &query_key![
            "leads",
            ListParams {
                filters: state.filters().clone(),
                page: 2,
                limit: 10
            }
        ]
    );
}

#[test]
fn revision_only_moves_on_real_changes() {
    let mut state = leads();
    state.go_to_page(1);
    state.update_filters(LeadFilters::default());
    state.clear_filter("status");
    state.clear_filter("no_such_field");
    state.change_limit(DEFAULT_PAGE_SIZE);
    assert_eq!(state.revision(), 0);

    let key = state.query_key().clone();
    state.update_filter(|f| f.search = Some("acme".into()));
    assert_eq!(state.revision(), 1);
    assert_ne!(state.query_key(), &key);

    state.update_filter(|f| f.search = Some("acme".into()));
    assert_eq!(state.revision(), 1);
}

fn lead_status() -> impl Strategy<Value = Option<LeadStatus>> {
    prop_oneof![
        Just(None),
        Just(Some(LeadStatus::New)),
        Just(Some(LeadStatus::Qualified)),
        Just(Some(LeadStatus::Won)),
    ]
}

proptest! {
    #[test]
    fn any_filter_update_lands_on_page_one(
        page in 1i64..500,
        status in lead_status(),
        search in proptest::option::of("[a-z]{0,8}"),
    ) {
        let mut state = leads();
        state.go_to_page(page);
        state.update_filters(LeadFilters { status, search, ..Default::default() });
        prop_assert_eq!(state.page(), 1);
    }

    #[test]
    fn page_is_never_zero(page in any::<i64>()) {
        let mut state = leads();
        state.go_to_page(page);
        prop_assert!(state.page() >= 1);
    }
}

// ── Debounce ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn debounce_yields_the_last_value_after_quiet_period() {
    let mut debouncer = Debouncer::new(String::new(), DEFAULT_DEBOUNCE);
    let input = debouncer.input();

    let typing = tokio::spawn(async move {
        for term in ["a", "ac", "acm", "acme"] {
            input.set(term.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    });

    let start = tokio::time::Instant::now();
    assert_eq!(debouncer.settled().await, "acme");
    assert!(start.elapsed() >= Duration::from_millis(600));
    assert_eq!(debouncer.latest(), "acme");
    typing.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn setting_the_current_value_is_not_a_change() {
    let mut debouncer = Debouncer::new(0u32, Duration::from_millis(300));
    debouncer.input().set(0);

    let settled = tokio::time::timeout(Duration::from_secs(1), debouncer.settled()).await;
    assert!(settled.is_err());

    debouncer.input().set(7);
    assert_eq!(debouncer.settled().await, 7);
}
