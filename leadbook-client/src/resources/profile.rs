use super::Binding;
use crate::keys;
use leadbook_api::AuthApi;
use leadbook_query::{Mutation, MutationOptions, QueryObserver};
use leadbook_session::SessionStore;
use leadbook_types::{ChangePasswordRequest, User, UserPatch, UserProfileForm};
use std::sync::Arc;
use tracing::warn;

/// The signed-in user's own profile.
#[derive(Debug, Clone)]
pub struct Profile {
    api: AuthApi,
    session: Arc<SessionStore>,
    binding: Binding,
}

impl Profile {
    pub(crate) fn new(api: AuthApi, session: Arc<SessionStore>, binding: Binding) -> Self {
        Self {
            api,
            session,
            binding,
        }
    }

    /// Disabled while nobody is signed in.
    pub fn profile(&self) -> QueryObserver<User> {
        let api = self.api.clone();
        self.binding.observe(
            keys::profile(),
            move || {
                let api = api.clone();
                async move { api.profile().await }
            },
            self.binding
                .options()
                .enabled(self.session.is_authenticated()),
        )
    }

    /// Saves the profile and applies the result to the session, so the
    /// persisted user matches what the server returned.
    pub fn update_profile(&self) -> Mutation<UserProfileForm, User> {
        let api = self.api.clone();
        let session = Arc::clone(&self.session);
        self.binding.mutation(
            move |form: UserProfileForm| {
                let api = api.clone();
                async move { api.update_profile(&form).await }
            },
            MutationOptions::new()
                .success_message("Profile updated successfully!")
                .invalidate(keys::profile())
                .on_success(move |user: &User, _| {
                    if let Err(e) = session.update_user(UserPatch::from(user)) {
                        warn!("failed to store updated profile: {e}");
                    }
                }),
        )
    }

    pub fn change_password(&self) -> Mutation<ChangePasswordRequest, ()> {
        let api = self.api.clone();
        self.binding.mutation(
            move |request: ChangePasswordRequest| {
                let api = api.clone();
                async move { api.change_password(&request).await }
            },
            MutationOptions::new().success_message("Password changed successfully!"),
        )
    }
}
