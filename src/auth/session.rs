use super::models::FirebaseUser;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The signed-in user shared by every client created from one app.
///
/// Cloning a `Session` yields another handle to the same user slot; signing in
/// through `FirebaseAuth` is immediately visible to Firestore and the Realtime
/// Database.
#[derive(Clone, Debug, Default)]
pub struct Session {
    user: Arc<RwLock<Option<FirebaseUser>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<FirebaseUser> {
        self.read().clone()
    }

    pub fn id_token(&self) -> Option<String> {
        self.read()
            .as_ref()
            .map(|user| user.id_token.clone())
            .filter(|token| !token.is_empty())
    }

    pub fn is_signed_in(&self) -> bool {
        self.read().is_some()
    }

    pub fn set(&self, user: FirebaseUser) {
        *self.write() = Some(user);
    }

    pub fn clear(&self) {
        *self.write() = None;
    }

    /// Applies `update` to the stored user, if any, and returns the result.
    pub(crate) fn update<F>(&self, update: F) -> Option<FirebaseUser>
    where
        F: FnOnce(&mut FirebaseUser),
    {
        let mut guard = self.write();
        guard.as_mut().map(|user| {
            update(user);
            user.clone()
        })
    }

    // A panic while holding the lock cannot leave the Option half-written.
    fn read(&self) -> RwLockReadGuard<'_, Option<FirebaseUser>> {
        self.user.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<FirebaseUser>> {
        self.user.write().unwrap_or_else(PoisonError::into_inner)
    }
}
