//! Session context threaded through every tenant-scoped store call.

use crate::models::Profile;
use uuid::Uuid;

/// The acting user and the agency their data belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub agency_id: Uuid,
}

impl SessionContext {
    pub fn new(user_id: Uuid, agency_id: Uuid) -> Self {
        Self { user_id, agency_id }
    }

    /// Returns true if a record owned by `agency_id` is visible in this session.
    pub fn owns(&self, agency_id: Uuid) -> bool {
        self.agency_id == agency_id
    }
}

impl From<&Profile> for SessionContext {
    fn from(profile: &Profile) -> Self {
        Self::new(profile.id, profile.agency_id)
    }
}
