use super::{Binding, LIST_STALE_TIME, RECORD_STALE_TIME, STATS_CACHE_TIME};
use crate::keys;
use futures::FutureExt;
use futures::future::BoxFuture;
use leadbook_api::{ApiResult, LeadQuery, LeadsApi, Upload};
use leadbook_query::{
    DEFAULT_DEBOUNCE, DebounceInput, Debouncer, ListParams, Mutation, MutationOptions,
    QueryObserver, QueryResult,
};
use leadbook_types::{
    Client, Comment, FileAttachment, ImportSummary, Lead, LeadFilters, LeadForm, LeadPatch,
    LeadPriority, LeadStats, LeadStatus, Page, RecordId,
};
use std::time::Duration;
use tracing::debug;

/// Searches shorter than this stay idle.
pub const MIN_SEARCH_LEN: usize = 2;

fn searchable(term: &str) -> bool {
    term.chars().count() >= MIN_SEARCH_LEN
}

fn search_fetcher(
    api: LeadsApi,
    term: String,
) -> impl Fn() -> BoxFuture<'static, ApiResult<Vec<Lead>>> + Send + Sync + 'static {
    move || {
        let api = api.clone();
        let term = term.clone();
        async move { api.search(&term).await }.boxed()
    }
}

fn list_fetcher(
    api: LeadsApi,
    params: ListParams<LeadFilters>,
) -> impl Fn() -> BoxFuture<'static, ApiResult<Page<Lead>>> + Send + Sync + 'static {
    let query = LeadQuery {
        filters: params.filters,
        page: Some(params.page),
        limit: Some(params.limit),
    };
    move || {
        let api = api.clone();
        let query = query.clone();
        async move { api.list(&query).await }.boxed()
    }
}

/// Queries and mutations over `leads`.
#[derive(Debug, Clone)]
pub struct Leads {
    api: LeadsApi,
    binding: Binding,
}

impl Leads {
    pub(crate) fn new(api: LeadsApi, binding: Binding) -> Self {
        Self { api, binding }
    }

    // ── Queries ─────────────────────────────────────────────────

    /// One page of leads. Keeps the previous page visible while the next
    /// one loads.
    pub fn list(&self, params: ListParams<LeadFilters>) -> QueryObserver<Page<Lead>> {
        self.binding.observe(
            keys::lead_list(&params),
            list_fetcher(self.api.clone(), params),
            self.binding
                .options()
                .keep_previous_data(true)
                .stale_time(LIST_STALE_TIME),
        )
    }

    /// Points a list observer at new filters or another page. Call
    /// [`QueryObserver::load`] afterwards.
    pub fn set_list_params(
        &self,
        observer: &mut QueryObserver<Page<Lead>>,
        params: ListParams<LeadFilters>,
    ) {
        observer.set_query(
            keys::lead_list(&params),
            list_fetcher(self.api.clone(), params),
        );
    }

    /// A single lead. An empty id leaves the query idle.
    pub fn get(&self, id: RecordId) -> QueryObserver<Lead> {
        let enabled = !id.is_empty();
        let api = self.api.clone();
        let key = keys::lead(&id);
        self.binding.observe(
            key,
            move || {
                let api = api.clone();
                let id = id.clone();
                async move { api.get(&id).await }
            },
            self.binding
                .options()
                .enabled(enabled)
                .stale_time(RECORD_STALE_TIME),
        )
    }

    pub fn stats(&self) -> QueryObserver<LeadStats> {
        let api = self.api.clone();
        self.binding.observe(
            keys::lead_stats(),
            move || {
                let api = api.clone();
                async move { api.stats().await }
            },
            self.binding
                .options()
                .stale_time(RECORD_STALE_TIME)
                .cache_time(STATS_CACHE_TIME),
        )
    }

    /// Leads matching `term`. Terms shorter than two characters never fetch.
    pub fn search(&self, term: &str) -> QueryObserver<Vec<Lead>> {
        self.binding.observe(
            keys::lead_search(term),
            search_fetcher(self.api.clone(), term.to_string()),
            self.binding
                .options()
                .enabled(searchable(term))
                .stale_time(LIST_STALE_TIME),
        )
    }

    /// A search fed by a debounced input, 300 ms unless `delay` says
    /// otherwise.
    pub fn search_debounced(&self, delay: Option<Duration>) -> LeadSearch {
        LeadSearch {
            api: self.api.clone(),
            debouncer: Debouncer::new(String::new(), delay.unwrap_or(DEFAULT_DEBOUNCE)),
            observer: self.search(""),
        }
    }

    // ── Mutations ───────────────────────────────────────────────

    pub fn create(&self) -> Mutation<LeadForm, Lead> {
        let api = self.api.clone();
        self.binding.mutation(
            move |form: LeadForm| {
                let api = api.clone();
                async move { api.create(&form).await }
            },
            MutationOptions::new()
                .success_message("Lead created successfully!")
                .invalidate(keys::leads()),
        )
    }

    pub fn update(&self) -> Mutation<(RecordId, LeadPatch), Lead> {
        let api = self.api.clone();
        self.binding.mutation(
            move |(id, patch): (RecordId, LeadPatch)| {
                let api = api.clone();
                async move { api.update(&id, &patch).await }
            },
            MutationOptions::new()
                .success_message("Lead updated successfully!")
                .invalidate(keys::leads()),
        )
    }

    pub fn delete(&self) -> Mutation<RecordId, ()> {
        let api = self.api.clone();
        self.binding.mutation(
            move |id: RecordId| {
                let api = api.clone();
                async move { api.delete(&id).await }
            },
            MutationOptions::new()
                .success_message("Lead removed successfully!")
                .invalidate(keys::leads()),
        )
    }

    /// Turns a lead into a client; both lists go stale.
    pub fn convert(&self) -> Mutation<RecordId, Client> {
        let api = self.api.clone();
        self.binding.mutation(
            move |id: RecordId| {
                let api = api.clone();
                async move { api.convert(&id).await }
            },
            MutationOptions::new()
                .success_message("Lead converted to client successfully!")
                .invalidate(keys::leads())
                .invalidate(keys::clients()),
        )
    }

    pub fn add_comment(&self) -> Mutation<(RecordId, String), Comment> {
        let api = self.api.clone();
        self.binding.mutation(
            move |(id, content): (RecordId, String)| {
                let api = api.clone();
                async move { api.add_comment(&id, &content).await }
            },
            MutationOptions::new()
                .success_message("Comment added successfully!")
                .invalidate(keys::leads()),
        )
    }

    pub fn upload_file(&self) -> Mutation<(RecordId, Upload), FileAttachment> {
        let api = self.api.clone();
        self.binding.mutation(
            move |(id, file): (RecordId, Upload)| {
                let api = api.clone();
                async move { api.upload_file(&id, file).await }
            },
            MutationOptions::new()
                .success_message("File uploaded successfully!")
                .invalidate(keys::leads()),
        )
    }

    pub fn update_status(&self) -> Mutation<(RecordId, LeadStatus), Lead> {
        let api = self.api.clone();
        self.binding.mutation(
            move |(id, status): (RecordId, LeadStatus)| {
                let api = api.clone();
                async move { api.update_status(&id, status).await }
            },
            MutationOptions::new()
                .success_message("Status updated successfully!")
                .invalidate(keys::leads()),
        )
    }

    pub fn update_priority(&self) -> Mutation<(RecordId, LeadPriority), Lead> {
        let api = self.api.clone();
        self.binding.mutation(
            move |(id, priority): (RecordId, LeadPriority)| {
                let api = api.clone();
                async move { api.update_priority(&id, priority).await }
            },
            MutationOptions::new()
                .success_message("Priority updated successfully!")
                .invalidate(keys::leads()),
        )
    }

    /// Downloads the filtered leads as a file. Nothing is invalidated.
    pub fn export(&self) -> Mutation<LeadFilters, Vec<u8>> {
        let api = self.api.clone();
        self.binding.mutation(
            move |filters: LeadFilters| {
                let api = api.clone();
                async move { api.export(&filters).await }
            },
            MutationOptions::new().success_message("Leads exported successfully!"),
        )
    }

    pub fn import(&self) -> Mutation<Upload, ImportSummary> {
        let api = self.api.clone();
        self.binding.mutation(
            move |file: Upload| {
                let api = api.clone();
                async move { api.import(file).await }
            },
            MutationOptions::new()
                .success_message("Leads imported successfully!")
                .invalidate(keys::leads()),
        )
    }
}

/// A lead search driven by keystrokes.
///
/// Feed raw input through [`input`](Self::input); [`settle`](Self::settle)
/// waits until typing pauses and then runs the search for the last term.
pub struct LeadSearch {
    api: LeadsApi,
    debouncer: Debouncer<String>,
    observer: QueryObserver<Vec<Lead>>,
}

impl LeadSearch {
    pub fn input(&self) -> DebounceInput<String> {
        self.debouncer.input()
    }

    /// Waits for the input to settle, then searches for it.
    pub async fn settle(&mut self) -> QueryResult<Vec<Lead>> {
        let term = self.debouncer.settled().await;
        debug!("searching leads for {term:?}");
        self.observer.set_query(
            keys::lead_search(&term),
            search_fetcher(self.api.clone(), term.clone()),
        );
        self.observer.set_enabled(searchable(&term));
        self.observer.load().await
    }

    pub fn result(&self) -> QueryResult<Vec<Lead>> {
        self.observer.result()
    }

    pub fn observer(&self) -> &QueryObserver<Vec<Lead>> {
        &self.observer
    }
}

impl std::fmt::Debug for LeadSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadSearch")
            .field("observer", &self.observer)
            .finish_non_exhaustive()
    }
}
