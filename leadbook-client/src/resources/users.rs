use super::Binding;
use crate::keys;
use leadbook_api::UsersApi;
use leadbook_query::{Mutation, MutationOptions, QueryObserver};
use leadbook_types::{RecordId, User, UserPatch};

/// Queries and mutations over `users`.
#[derive(Debug, Clone)]
pub struct Users {
    api: UsersApi,
    binding: Binding,
}

impl Users {
    pub(crate) fn new(api: UsersApi, binding: Binding) -> Self {
        Self { api, binding }
    }

    pub fn list(&self) -> QueryObserver<Vec<User>> {
        let api = self.api.clone();
        self.binding.observe(
            keys::users(),
            move || {
                let api = api.clone();
                async move { api.list().await }
            },
            self.binding.options(),
        )
    }

    pub fn get(&self, id: RecordId) -> QueryObserver<User> {
        let enabled = !id.is_empty();
        let key = keys::user(&id);
        let api = self.api.clone();
        self.binding.observe(
            key,
            move || {
                let api = api.clone();
                let id = id.clone();
                async move { api.get(&id).await }
            },
            self.binding.options().enabled(enabled),
        )
    }

    pub fn update(&self) -> Mutation<(RecordId, UserPatch), User> {
        let api = self.api.clone();
        self.binding.mutation(
            move |(id, patch): (RecordId, UserPatch)| {
                let api = api.clone();
                async move { api.update(&id, &patch).await }
            },
            MutationOptions::new()
                .success_message("User updated successfully!")
                .invalidate(keys::users()),
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
                .success_message("User removed successfully!")
                .invalidate(keys::users()),
        )
    }
}
