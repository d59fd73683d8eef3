use std::sync::Arc;

use crate::{
    consts::consts::{
        Email, ACTIVE, DETAILS_PROJECTION, EMAIL, HOME, IDENTITY_ATTRIBUTES, PARTICIPANT_KEY,
        STATUS_PROJECTION, UPDATED_ATTRIBUTES, WORK,
    },
    model::participant::{Participant, ParticipantUpdate},
    persistence::storage::{
        Condition, Document, DocumentStore, Filter, Key, PutRequest, QueryRequest, ScanRequest,
        StorageError, StorageResult, TableDefinition, UpdateRequest,
    },
};

/// Typed access to the participant table
///
/// Every method maps to exactly one store call. Reads scoped to "active" participants filter on
/// `active = true`, deletes are soft and only flip `active` to false. Items are handed back as
/// stored, a row missing attributes is returned without them.
#[derive(Clone)]
pub struct ParticipantRepository {
    store: Arc<dyn DocumentStore>,
    table: String,
}

impl ParticipantRepository {
    pub fn new(store: Arc<dyn DocumentStore>, table: &str) -> Self {
        Self {
            store,
            table: table.to_string(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Creates the participant table if it does not exist
    #[tracing::instrument(skip(self))]
    pub async fn init(&self) -> StorageResult<()> {
        self.store
            .init_table(TableDefinition {
                table: self.table.clone(),
                key: PARTICIPANT_KEY.to_string(),
            })
            .await
    }

    /// Unconditional put of the record as given, an existing participant with the same email is
    /// overwritten
    #[tracing::instrument(skip(self, participant), fields(email = ?participant.email()))]
    pub async fn add(&self, participant: &Participant) -> StorageResult<()> {
        self.store
            .put(PutRequest {
                table: self.table.clone(),
                item: participant.as_document().clone(),
            })
            .await
    }

    /// Every participant regardless of the active flag, no projection
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self) -> StorageResult<Vec<Participant>> {
        let items = self.store.scan(ScanRequest::new(&self.table)).await?;

        Ok(into_participants(items))
    }

    /// Personal details of every participant whose active flag equals `active`
    #[tracing::instrument(skip(self))]
    pub async fn list_details(&self, active: bool) -> StorageResult<Vec<Participant>> {
        let request = ScanRequest::new(&self.table)
            .set_filter(Filter::equals(ACTIVE, active))
            .set_projection(&DETAILS_PROJECTION);

        Ok(into_participants(self.store.scan(request).await?))
    }

    /// Personal details of an active participant, empty when missing or soft deleted
    #[tracing::instrument(skip(self))]
    pub async fn find_active(&self, email: &Email) -> StorageResult<Vec<Participant>> {
        let items = self.query_active(email, &STATUS_PROJECTION).await?;

        Ok(into_participants(items))
    }

    /// `{work}` of an active participant
    #[tracing::instrument(skip(self))]
    pub async fn find_active_work(&self, email: &Email) -> StorageResult<Option<Participant>> {
        let items = self.query_active(email, &[WORK]).await?;

        Ok(items.into_iter().next().map(Participant::from))
    }

    /// `{home}` of an active participant
    #[tracing::instrument(skip(self))]
    pub async fn find_active_home(&self, email: &Email) -> StorageResult<Option<Participant>> {
        let items = self.query_active(email, &[HOME]).await?;

        Ok(items.into_iter().next().map(Participant::from))
    }

    /// Sets `active` to false, only when the participant already has an `active` attribute.
    ///
    /// Returns the identity attributes present after the update, or `None` when the condition
    /// does not hold (including when the participant does not exist), in which case nothing is
    /// written.
    #[tracing::instrument(skip(self))]
    pub async fn soft_delete(&self, email: &Email) -> StorageResult<Option<Participant>> {
        let request = UpdateRequest::new(&self.table, Key::new(PARTICIPANT_KEY, email.as_str()))
            .set(ACTIVE, false)
            .set_condition(Condition::AttributeExists(ACTIVE.to_string()));

        match self.store.update(request).await {
            Ok(item) => Ok(Some(Participant::from(item).pick(&IDENTITY_ATTRIBUTES))),
            Err(StorageError::ConditionalCheckFailed) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Overwrites every attribute other than the email and returns them with the email.
    ///
    /// The update carries no existence condition, so updating an unknown email creates it and
    /// updating a soft deleted participant with `active: true` restores it.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(
        &self,
        email: &Email,
        update: ParticipantUpdate,
    ) -> StorageResult<Option<Participant>> {
        let request = update.into_attributes().into_iter().fold(
            UpdateRequest::new(&self.table, Key::new(PARTICIPANT_KEY, email.as_str())),
            |request, (attribute, value)| request.set(&attribute, value),
        );

        match self.store.update(request).await {
            Ok(item) => {
                let mut updated = Participant::from(item).pick(&UPDATED_ATTRIBUTES);
                updated.set(EMAIL, email.as_str());

                Ok(Some(updated))
            }
            Err(StorageError::ConditionalCheckFailed) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn query_active(&self, email: &Email, projection: &[&str]) -> StorageResult<Vec<Document>> {
        let request = QueryRequest::new(&self.table, Key::new(PARTICIPANT_KEY, email.as_str()))
            .set_filter(Filter::equals(ACTIVE, true))
            .set_projection(projection);

        self.store.query(request).await
    }
}

fn into_participants(documents: Vec<Document>) -> Vec<Participant> {
    documents.into_iter().map(Participant::from).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::{
        consts::consts::PARTICIPANT_TABLE, persistence::storage::memory::MemoryStorage,
    };

    use super::*;

    async fn test_repository() -> (ParticipantRepository, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let repository = ParticipantRepository::new(storage.clone(), PARTICIPANT_TABLE);

        repository.init().await.expect("should create table");

        (repository, storage)
    }

    fn document(value: Value) -> Document {
        value.as_object().expect("should be an object").clone()
    }

    async fn seed(storage: &MemoryStorage, value: Value) {
        storage
            .put(PutRequest {
                table: PARTICIPANT_TABLE.to_string(),
                item: document(value),
            })
            .await
            .expect("should put item");
    }

    fn as_json(participant: &Participant) -> Value {
        serde_json::to_value(participant).unwrap()
    }

    #[tokio::test]
    async fn added_participant_is_listed() {
        let (repository, _) = test_repository().await;
        let participant = Participant::new_test("johndoe@gmail.com");

        repository.add(&participant).await.unwrap();

        assert_eq!(repository.list_all().await.unwrap(), vec![participant]);
    }

    #[tokio::test]
    async fn added_participant_keeps_unvalidated_attributes() {
        let (repository, storage) = test_repository().await;
        let mut participant = Participant::new_test("a@b.com");
        participant.set("phone", "555-0100");
        participant.set("work", json!({ "salary": "5k", "title": "CTO" }));

        repository.add(&participant).await.unwrap();

        let items = storage.scan(ScanRequest::new(PARTICIPANT_TABLE)).await.unwrap();
        assert_eq!(&items[0], participant.as_document());
    }

    #[tokio::test]
    async fn details_are_split_by_active_flag() {
        // Given one active and one deleted participant
        let (repository, _) = test_repository().await;

        let active = Participant::new_test("active@x.com");
        let mut deleted = Participant::new_test("deleted@x.com");
        deleted.set(ACTIVE, false);

        repository.add(&active).await.unwrap();
        repository.add(&deleted).await.unwrap();

        // Then each list only contains the matching participant's personal details
        let active_details = repository.list_details(true).await.unwrap();
        let deleted_details = repository.list_details(false).await.unwrap();

        assert_eq!(active_details, vec![active.pick(&DETAILS_PROJECTION)]);
        assert_eq!(deleted_details, vec![deleted.pick(&DETAILS_PROJECTION)]);

        // And list all returns both
        assert_eq!(repository.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn partial_rows_are_listed_as_stored() {
        // Given a row missing most attributes
        let (repository, storage) = test_repository().await;
        seed(&storage, json!({ "email": "a@b.com", "firstname": "A", "lastname": "B" })).await;
        seed(&storage, json!({ "email": "c@d.com", "active": false })).await;

        // Then listings return it without the missing attributes
        let all = repository.list_all().await.unwrap();
        assert_eq!(
            as_json(&all[0]),
            json!({ "email": "a@b.com", "firstname": "A", "lastname": "B" })
        );

        let deleted = repository.list_details(false).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(as_json(&deleted[0]), json!({ "email": "c@d.com" }));
    }

    #[tokio::test]
    async fn find_active_projects_status_fields() {
        let (repository, _) = test_repository().await;
        let participant = Participant::new_test("a@b.com");
        repository.add(&participant).await.unwrap();

        let found = repository.find_active(&Email::from("a@b.com")).await.unwrap();

        assert_eq!(found, vec![participant.pick(&STATUS_PROJECTION)]);
    }

    #[tokio::test]
    async fn work_and_home_projections_of_active_participant() {
        let (repository, _) = test_repository().await;
        let participant = Participant::new_test("a@b.com");
        repository.add(&participant).await.unwrap();

        let email = Email::from("a@b.com");
        let work = repository.find_active_work(&email).await.unwrap();
        let home = repository.find_active_home(&email).await.unwrap();

        assert_eq!(work, Some(participant.pick(&[WORK])));
        assert_eq!(home, Some(participant.pick(&[HOME])));
    }

    #[tokio::test]
    async fn missing_participant_is_not_found_by_any_read() {
        let (repository, _) = test_repository().await;
        let email = Email::from("nobody@x.com");

        assert!(repository.find_active(&email).await.unwrap().is_empty());
        assert!(repository.find_active_work(&email).await.unwrap().is_none());
        assert!(repository.find_active_home(&email).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn soft_delete_hides_participant_from_active_reads() {
        // Given an active participant
        let (repository, _) = test_repository().await;
        let participant = Participant::new_test("a@b.com");
        repository.add(&participant).await.unwrap();
        let email = Email::from("a@b.com");

        // When it is deleted
        let deleted = repository
            .soft_delete(&email)
            .await
            .unwrap()
            .expect("should delete");

        // Then the identity is returned with active set to false
        assert_eq!(
            as_json(&deleted),
            json!({ "email": "a@b.com", "firstname": "John", "lastname": "Doe", "active": false })
        );

        // And it no longer shows up in active reads, but the row persists
        assert!(repository.find_active(&email).await.unwrap().is_empty());

        let all = repository.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get(WORK), participant.get(WORK));
        assert_eq!(all[0].get(ACTIVE), Some(&json!(false)));
    }

    #[tokio::test]
    async fn soft_delete_of_row_without_names_returns_what_it_has() {
        // Given an active row with no first or last name
        let (repository, storage) = test_repository().await;
        seed(&storage, json!({ "email": "a@b.com", "active": true })).await;

        // When it is deleted
        let deleted = repository
            .soft_delete(&Email::from("a@b.com"))
            .await
            .unwrap()
            .expect("should delete");

        // Then the reply only carries the present attributes
        assert_eq!(as_json(&deleted), json!({ "email": "a@b.com", "active": false }));
    }

    #[tokio::test]
    async fn soft_delete_of_unknown_participant_writes_nothing() {
        let (repository, _) = test_repository().await;

        let deleted = repository.soft_delete(&Email::from("x@y.com")).await.unwrap();

        assert!(deleted.is_none());
        assert!(repository.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn soft_delete_requires_active_attribute() {
        // Given a row that was written without an active attribute
        let (repository, storage) = test_repository().await;
        seed(&storage, json!({ "email": "a@b.com", "firstname": "A", "lastname": "B" })).await;

        // Then deleting it does nothing
        let deleted = repository.soft_delete(&Email::from("a@b.com")).await.unwrap();

        assert!(deleted.is_none());

        let items = storage.scan(ScanRequest::new(PARTICIPANT_TABLE)).await.unwrap();
        assert!(!items[0].contains_key("active"));
    }

    #[tokio::test]
    async fn update_replaces_everything_but_email() {
        let (repository, _) = test_repository().await;
        repository.add(&Participant::new_test("a@b.com")).await.unwrap();

        let mut changed = Participant::new_test("ignored@b.com");
        changed.set("firstname", "Jane");
        changed.set("dob", "1999/12/31");
        changed.set(WORK, json!({ "title": "CTO" }));

        let email = Email::from("a@b.com");
        let updated = repository
            .update(&email, ParticipantUpdate::from(&changed))
            .await
            .unwrap()
            .expect("should update");

        let mut expected = changed.clone();
        expected.set(EMAIL, "a@b.com");
        assert_eq!(updated, expected);

        let found = repository.find_active(&email).await.unwrap();
        assert_eq!(found[0].get("firstname"), Some(&json!("Jane")));
    }

    #[tokio::test]
    async fn update_reply_leaves_out_unset_attributes() {
        let (repository, _) = test_repository().await;
        let mut partial = Participant::default();
        partial.set(ACTIVE, true);

        let updated = repository
            .update(&Email::from("a@b.com"), ParticipantUpdate::from(&partial))
            .await
            .unwrap()
            .expect("should update");

        assert_eq!(as_json(&updated), json!({ "email": "a@b.com", "active": true }));
    }

    #[tokio::test]
    async fn update_of_unknown_email_creates_it() {
        let (repository, _) = test_repository().await;
        let participant = Participant::new_test("new@x.com");

        let updated = repository
            .update(&Email::from("new@x.com"), ParticipantUpdate::from(&participant))
            .await
            .unwrap();

        assert_eq!(updated, Some(participant));
        assert_eq!(repository.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_errors_are_propagated() {
        // Repository pointed at a table that was never created
        let repository = ParticipantRepository::new(Arc::new(MemoryStorage::new()), "Missing");

        let result = repository.list_details(true).await;

        assert!(matches!(result, Err(StorageError::TableNotFound(_))));
    }
}
