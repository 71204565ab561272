use super::Binding;
use crate::keys;
use leadbook_api::TeamsApi;
use leadbook_query::{Mutation, MutationOptions, QueryObserver};
use leadbook_session::SessionStore;
use leadbook_types::{RecordId, Team, TeamForm, TeamPatch, User, UserPatch};
use std::sync::Arc;
use tracing::warn;

/// Queries and mutations over `teams`.
#[derive(Debug, Clone)]
pub struct Teams {
    api: TeamsApi,
    session: Arc<SessionStore>,
    binding: Binding,
}

impl Teams {
    pub(crate) fn new(api: TeamsApi, session: Arc<SessionStore>, binding: Binding) -> Self {
        Self {
            api,
            session,
            binding,
        }
    }

    pub fn list(&self) -> QueryObserver<Vec<Team>> {
        let api = self.api.clone();
        self.binding.observe(
            keys::teams(),
            move || {
                let api = api.clone();
                async move { api.list().await }
            },
            self.binding.options(),
        )
    }

    pub fn get(&self, id: RecordId) -> QueryObserver<Team> {
        let enabled = !id.is_empty();
        let key = keys::team(&id);
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

    pub fn create(&self) -> Mutation<TeamForm, Team> {
        let api = self.api.clone();
        self.binding.mutation(
            move |form: TeamForm| {
                let api = api.clone();
                async move { api.create(&form).await }
            },
            MutationOptions::new()
                .success_message("Team created successfully!")
                .invalidate(keys::teams()),
        )
    }

    pub fn update(&self) -> Mutation<(RecordId, TeamPatch), Team> {
        let api = self.api.clone();
        self.binding.mutation(
            move |(id, patch): (RecordId, TeamPatch)| {
                let api = api.clone();
                async move { api.update(&id, &patch).await }
            },
            MutationOptions::new()
                .success_message("Team updated successfully!")
                .invalidate(keys::teams()),
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
                .success_message("Team removed successfully!")
                .invalidate(keys::teams()),
        )
    }

    /// Changes the active team. The returned user replaces the session's
    /// copy and the profile query goes stale.
    pub fn switch(&self) -> Mutation<RecordId, User> {
        let api = self.api.clone();
        let session = Arc::clone(&self.session);
        self.binding.mutation(
            move |id: RecordId| {
                let api = api.clone();
                async move { api.switch(&id).await }
            },
            MutationOptions::new()
                .success_message("Team switched successfully!")
                .invalidate(keys::teams())
                .invalidate(keys::profile())
                .on_success(move |user: &User, _| {
                    if let Err(e) = session.update_user(UserPatch::from(user)) {
                        warn!("failed to store switched team: {e}");
                    }
                }),
        )
    }

    /// Variables: team and invitee email.
    pub fn invite(&self) -> Mutation<(RecordId, String), ()> {
        let api = self.api.clone();
        self.binding.mutation(
            move |(id, email): (RecordId, String)| {
                let api = api.clone();
                async move { api.invite(&id, &email).await }
            },
            MutationOptions::new()
                .success_message("Invitation sent successfully!")
                .invalidate(keys::teams()),
        )
    }

    /// Variables: team and member.
    pub fn remove_member(&self) -> Mutation<(RecordId, RecordId), ()> {
        let api = self.api.clone();
        self.binding.mutation(
            move |(team, user): (RecordId, RecordId)| {
                let api = api.clone();
                async move { api.remove_member(&team, &user).await }
            },
            MutationOptions::new()
                .success_message("Member removed successfully!")
                .invalidate(keys::teams()),
        )
    }
}
