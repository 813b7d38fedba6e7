use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use tracing::debug;

use crate::PlatformError;

/// Stores an avatar image and returns its public URL.
pub trait AvatarUploader: Send + Sync {
    fn upload(&self, user_id: u64, bytes: &[u8], content_type: &str)
    -> Result<String, PlatformError>;
}

#[derive(Debug, Clone)]
pub struct InMemoryAvatarUploader {
    base_url: String,
    uploads: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryAvatarUploader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            uploads: Arc::new(AtomicU64::new(0)),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl Default for InMemoryAvatarUploader {
    fn default() -> Self {
        Self::new("memory://storage")
    }
}

impl AvatarUploader for InMemoryAvatarUploader {
    fn upload(
        &self,
        user_id: u64,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, PlatformError> {
        if !content_type.starts_with("image/") {
            return Err(PlatformError::Invalid("Please choose an image".to_owned()));
        }
        if bytes.is_empty() {
            return Err(PlatformError::Invalid("image is empty".to_owned()));
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PlatformError::Unavailable("object storage offline".to_owned()));
        }

        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        let url = format!("{}/avatars/{user_id}/{n}.jpg", self.base_url);
        debug!(user_id, size = bytes.len(), %url, "stored avatar");
        Ok(url)
    }
}
