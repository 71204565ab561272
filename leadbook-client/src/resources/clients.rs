use super::{Binding, LIST_STALE_TIME, RECORD_STALE_TIME, STATS_CACHE_TIME};
use crate::keys;
use futures::FutureExt;
use futures::future::BoxFuture;
use leadbook_api::{ApiResult, ClientQuery, ClientsApi, Upload};
use leadbook_query::{ListParams, Mutation, MutationOptions, QueryObserver};
use leadbook_types::{
    Client, ClientFilters, ClientForm, ClientPatch, ClientStats, Comment, FileAttachment, Page,
    RecordId,
};

fn list_fetcher(
    api: ClientsApi,
    params: ListParams<ClientFilters>,
) -> impl Fn() -> BoxFuture<'static, ApiResult<Page<Client>>> + Send + Sync + 'static {
    let query = ClientQuery {
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

/// Queries and mutations over `clients`.
#[derive(Debug, Clone)]
pub struct Clients {
    api: ClientsApi,
    binding: Binding,
}

impl Clients {
    pub(crate) fn new(api: ClientsApi, binding: Binding) -> Self {
        Self { api, binding }
    }

    pub fn list(&self, params: ListParams<ClientFilters>) -> QueryObserver<Page<Client>> {
        self.binding.observe(
            keys::client_list(&params),
            list_fetcher(self.api.clone(), params),
            self.binding
                .options()
                .keep_previous_data(true)
                .stale_time(LIST_STALE_TIME),
        )
    }

    pub fn set_list_params(
        &self,
        observer: &mut QueryObserver<Page<Client>>,
        params: ListParams<ClientFilters>,
    ) {
        observer.set_query(
            keys::client_list(&params),
            list_fetcher(self.api.clone(), params),
        );
    }

    pub fn get(&self, id: RecordId) -> QueryObserver<Client> {
        let enabled = !id.is_empty();
        let key = keys::client(&id);
        let api = self.api.clone();
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

    pub fn stats(&self) -> QueryObserver<ClientStats> {
        let api = self.api.clone();
        self.binding.observe(
            keys::client_stats(),
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

    pub fn create(&self) -> Mutation<ClientForm, Client> {
        let api = self.api.clone();
        self.binding.mutation(
            move |form: ClientForm| {
                let api = api.clone();
                async move { api.create(&form).await }
            },
            MutationOptions::new()
                .success_message("Client created successfully!")
                .invalidate(keys::clients()),
        )
    }

    pub fn update(&self) -> Mutation<(RecordId, ClientPatch), Client> {
        let api = self.api.clone();
        self.binding.mutation(
            move |(id, patch): (RecordId, ClientPatch)| {
                let api = api.clone();
                async move { api.update(&id, &patch).await }
            },
            MutationOptions::new()
                .success_message("Client updated successfully!")
                .invalidate(keys::clients()),
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
                .success_message("Client removed successfully!")
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
                .invalidate(keys::clients()),
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
                .invalidate(keys::clients()),
        )
    }
}
