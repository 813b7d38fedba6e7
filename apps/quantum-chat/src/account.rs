//! Sign-in, chat creation and avatar upload flows over the platform services.

use std::sync::{Arc, Mutex, MutexGuard};

use chat_core::{Chat, ChatError, ChatKind, ErrorCategory};
use chat_platform::{
    AvatarUploader, ChatDirectory, ChatType, CreateChatRequest, CreatedChat, IdentityProvider,
    PlatformError, SessionStore, UserRecord,
};
use tracing::{debug, info, warn};

/// Services the account flows depend on.
#[derive(Clone)]
pub struct PlatformServices {
    pub identity: Arc<dyn IdentityProvider>,
    pub directory: Arc<dyn ChatDirectory>,
    pub avatars: Arc<dyn AvatarUploader>,
    pub store: Arc<dyn SessionStore>,
}

/// Tracks the signed-in user and turns platform failures into [`ChatError`]s.
pub struct AccountService {
    services: PlatformServices,
    current: Mutex<Option<UserRecord>>,
}

impl AccountService {
    pub fn new(services: PlatformServices) -> Self {
        Self {
            services,
            current: Mutex::new(None),
        }
    }

    /// Load a remembered user. A broken session file is logged and ignored.
    pub fn restore(&self) -> Option<UserRecord> {
        match self.services.store.load() {
            Ok(Some(user)) => {
                info!(user_id = user.id, "restored signed-in user");
                *self.current() = Some(user.clone());
                Some(user)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "failed loading saved session; ignoring it");
                None
            }
        }
    }

    pub fn current_user(&self) -> Option<UserRecord> {
        self.current().clone()
    }

    pub fn login(&self, credential: &str) -> Result<UserRecord, ChatError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(ChatError::validation(
                "missing_credential",
                "Enter a sign-in token",
            ));
        }

        let user = self
            .services
            .identity
            .exchange(credential)
            .map_err(|err| platform_error("login_failed", err))?;
        if let Err(err) = self.services.store.save(&user) {
            warn!(error = %err, "failed persisting session after login");
        }
        info!(user_id = user.id, "signed in");
        *self.current() = Some(user.clone());
        Ok(user)
    }

    /// Forget the user locally even when clearing the saved session fails.
    pub fn logout(&self) -> Result<(), ChatError> {
        let previous = self.current().take();
        debug!(user_id = previous.as_ref().map(|user| user.id), "signing out");
        self.services
            .store
            .clear()
            .map_err(|err| platform_error("logout_failed", err))
    }

    /// Create a group or channel and convert it into a sidebar chat.
    pub fn create_chat(
        &self,
        name: &str,
        chat_type: ChatType,
        member_ids: Vec<u64>,
    ) -> Result<Chat, ChatError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::validation("blank_chat_name", "Enter a chat name"));
        }
        let user = self.require_user()?;

        let request = CreateChatRequest {
            name: name.to_owned(),
            chat_type,
            avatar_url: String::new(),
            member_ids,
        };
        let created = self
            .services
            .directory
            .create_chat(user.id, &request)
            .map_err(|err| platform_error("create_chat_failed", err))?;
        Ok(chat_from_created(created))
    }

    /// Upload a new avatar for the signed-in user and return its URL.
    pub fn upload_avatar(&self, bytes: &[u8], content_type: &str) -> Result<String, ChatError> {
        let user = self.require_user()?;
        let url = self
            .services
            .avatars
            .upload(user.id, bytes, content_type)
            .map_err(|err| platform_error("upload_failed", err))?;

        let mut current = self.current();
        if let Some(current) = current.as_mut() {
            current.avatar_url = url.clone();
            if let Err(err) = self.services.store.save(current) {
                warn!(error = %err, "failed persisting session after avatar change");
            }
        }
        Ok(url)
    }

    fn require_user(&self) -> Result<UserRecord, ChatError> {
        self.current_user()
            .ok_or_else(|| ChatError::validation("not_signed_in", "Sign in first"))
    }

    fn current(&self) -> MutexGuard<'_, Option<UserRecord>> {
        self.current.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn chat_from_created(created: CreatedChat) -> Chat {
    let kind = match created.chat_type {
        ChatType::Group => ChatKind::Group,
        ChatType::Channel => ChatKind::Channel,
    };
    let avatar = if created.avatar_url.is_empty() {
        kind.default_avatar().to_owned()
    } else {
        created.avatar_url
    };
    Chat::new(format!("chat-{}", created.id), created.name, avatar).with_kind(kind)
}

/// Map a platform failure onto the stable error shape.
pub fn platform_error(code: &str, err: PlatformError) -> ChatError {
    match err {
        PlatformError::Invalid(message) => ChatError::new(ErrorCategory::Validation, code, message),
        PlatformError::Unauthorized => {
            ChatError::new(ErrorCategory::Auth, code, "credential rejected")
        }
        PlatformError::Unavailable(message) => {
            ChatError::new(ErrorCategory::Network, code, message)
        }
        PlatformError::Storage(message) => ChatError::new(ErrorCategory::Storage, code, message),
        PlatformError::Serialization(message) => {
            ChatError::new(ErrorCategory::Serialization, code, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use chat_core::{NoticeLevel, RemoteAction, notice_for_failure};
    use chat_platform::{
        IdentityClaims, InMemoryAvatarUploader, InMemoryChatDirectory, InMemoryIdentityProvider,
        InMemorySessionStore,
    };

    use super::*;

    struct Fixture {
        account: AccountService,
        identity: InMemoryIdentityProvider,
        directory: InMemoryChatDirectory,
        avatars: InMemoryAvatarUploader,
        store: InMemorySessionStore,
    }

    struct FailingStore;

    impl SessionStore for FailingStore {
        fn load(&self) -> Result<Option<UserRecord>, PlatformError> {
            Err(PlatformError::Storage("disk gone".to_owned()))
        }
        fn save(&self, _user: &UserRecord) -> Result<(), PlatformError> {
            Err(PlatformError::Storage("disk gone".to_owned()))
        }
        fn clear(&self) -> Result<(), PlatformError> {
            Err(PlatformError::Storage("disk gone".to_owned()))
        }
    }

    fn fixture() -> Fixture {
        let identity = InMemoryIdentityProvider::default();
        identity
            .register_credential(
                "demo",
                IdentityClaims {
                    subject: "sub-1".to_owned(),
                    email: "demo@example.org".to_owned(),
                    name: "Demo".to_owned(),
                    picture: String::new(),
                },
            )
            .expect("register");
        let directory = InMemoryChatDirectory::default();
        let avatars = InMemoryAvatarUploader::default();
        let store = InMemorySessionStore::default();
        let account = AccountService::new(PlatformServices {
            identity: Arc::new(identity.clone()),
            directory: Arc::new(directory.clone()),
            avatars: Arc::new(avatars.clone()),
            store: Arc::new(store.clone()),
        });
        Fixture {
            account,
            identity,
            directory,
            avatars,
            store,
        }
    }

    #[test]
    fn login_persists_and_restore_picks_it_up() {
        let fx = fixture();
        let user = fx.account.login(" demo ").expect("login should work");
        assert_eq!(fx.store.load().expect("load"), Some(user.clone()));

        let fresh = AccountService::new(PlatformServices {
            identity: Arc::new(fx.identity.clone()),
            directory: Arc::new(fx.directory.clone()),
            avatars: Arc::new(fx.avatars.clone()),
            store: Arc::new(fx.store.clone()),
        });
        assert_eq!(fresh.restore(), Some(user));

        fresh.logout().expect("logout should work");
        assert_eq!(fresh.current_user(), None);
        assert_eq!(fx.store.load().expect("load"), None);
    }

    #[test]
    fn rejected_login_becomes_generic_error_notice() {
        let fx = fixture();
        let err = fx.account.login("stolen").expect_err("unknown credential");
        assert_eq!(err.category, ErrorCategory::Auth);

        let notice = notice_for_failure(RemoteAction::Login, &err);
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.description, "Could not sign in");
    }

    #[test]
    fn identity_outage_maps_to_network() {
        let fx = fixture();
        fx.identity.set_unavailable(true);
        let err = fx.account.login("demo").expect_err("outage");
        assert_eq!(err.category, ErrorCategory::Network);
        assert_eq!(fx.account.current_user(), None);
    }

    #[test]
    fn create_chat_validates_and_maps_kind() {
        let fx = fixture();
        let err = fx
            .account
            .create_chat("  ", ChatType::Group, vec![])
            .expect_err("blank name");
        assert_eq!(err.category, ErrorCategory::Validation);
        assert_eq!(
            notice_for_failure(RemoteAction::CreateChat, &err).description,
            "Enter a chat name"
        );

        let err = fx
            .account
            .create_chat("News", ChatType::Channel, vec![])
            .expect_err("signed out");
        assert_eq!(err.code, "not_signed_in");

        fx.account.login("demo").expect("login");
        let chat = fx
            .account
            .create_chat("News", ChatType::Channel, vec![2])
            .expect("create");
        assert_eq!(chat.id, "chat-1");
        assert_eq!(chat.kind, ChatKind::Channel);
        assert_eq!(chat.avatar, ChatKind::Channel.default_avatar());
        assert!(chat.messages.is_empty());
        assert_eq!(fx.directory.chats()[0].members.len(), 2);
    }

    #[test]
    fn directory_outage_is_reported_generically() {
        let fx = fixture();
        fx.account.login("demo").expect("login");
        fx.directory.set_unavailable(true);
        let err = fx
            .account
            .create_chat("Team", ChatType::Group, vec![])
            .expect_err("outage");
        let notice = notice_for_failure(RemoteAction::CreateChat, &err);
        assert_eq!(notice.description, "Could not create the chat");
    }

    #[test]
    fn avatar_upload_updates_saved_user() {
        let fx = fixture();
        fx.account.login("demo").expect("login");

        let err = fx
            .account
            .upload_avatar(b"%PDF", "application/pdf")
            .expect_err("not an image");
        assert_eq!(
            notice_for_failure(RemoteAction::UploadAvatar, &err).description,
            "Please choose an image"
        );

        let url = fx
            .account
            .upload_avatar(b"jpeg", "image/jpeg")
            .expect("upload");
        let saved = fx.store.load().expect("load").expect("saved user");
        assert_eq!(saved.avatar_url, url);
    }

    #[test]
    fn storage_failures_do_not_block_login_but_fail_logout() {
        let identity = InMemoryIdentityProvider::default();
        identity
            .register_credential(
                "demo",
                IdentityClaims {
                    subject: "sub-9".to_owned(),
                    email: "x@example.org".to_owned(),
                    name: "X".to_owned(),
                    picture: String::new(),
                },
            )
            .expect("register");
        let account = AccountService::new(PlatformServices {
            identity: Arc::new(identity),
            directory: Arc::new(InMemoryChatDirectory::default()),
            avatars: Arc::new(InMemoryAvatarUploader::default()),
            store: Arc::new(FailingStore),
        });

        assert_eq!(account.restore(), None);
        account.login("demo").expect("login should survive a broken store");

        let err = account.logout().expect_err("clear fails");
        assert_eq!(err.category, ErrorCategory::Storage);
        assert_eq!(
            notice_for_failure(RemoteAction::Logout, &err).description,
            "Could not sign out"
        );
        assert_eq!(account.current_user(), None);
    }
}
