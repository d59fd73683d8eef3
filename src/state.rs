use database::database::repository::ParticipantRepository;

use crate::auth::AdminCredentials;

/// Shared by every worker through `web::Data`
#[derive(Clone)]
pub struct AppState {
    pub repository: ParticipantRepository,
    pub admin: AdminCredentials,
}

impl AppState {
    pub fn new(repository: ParticipantRepository, admin: AdminCredentials) -> Self {
        Self { repository, admin }
    }
}
