//! In-memory implementation of every repository port.
//!
//! Mirrors the relational schema's semantics closely enough for handler and
//! seeding tests: uniqueness constraints, cascade deletes, and the
//! note-activity ordering of user search. One `Mutex` guards the whole store,
//! matching the serialised view a single test observes.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::auth::UserLookup;
use crate::domain::ports::{
    AccessRepository, AccountRepository, NoteRepository, RepositoryError, SeedRepository,
    SessionRepository, VerificationRepository,
};
use crate::domain::{
    Connection, ImageData, ImageMetadata, NewImage, Note, NoteExport, Permission, PermissionSpec,
    RecordId, Role, Session, User, UserExport, UserListing, Username, Verification,
    VerificationKind,
};

#[derive(Debug, Clone)]
struct StoredImage {
    id: RecordId,
    alt_text: Option<String>,
    content_type: String,
    blob: Vec<u8>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredImage {
    fn from_new(image: &NewImage) -> Self {
        let now = Utc::now();
        Self {
            id: image.id.clone(),
            alt_text: image.alt_text.clone(),
            content_type: image.content_type.clone(),
            blob: image.blob.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn metadata(&self) -> ImageMetadata {
        ImageMetadata {
            id: self.id.clone(),
            alt_text: self.alt_text.clone(),
            content_type: self.content_type.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn data(&self) -> ImageData {
        ImageData {
            id: self.id.clone(),
            content_type: self.content_type.clone(),
            blob: self.blob.clone(),
        }
    }
}

#[derive(Default)]
struct Store {
    users: Vec<User>,
    passwords: HashMap<String, String>,
    connections: Vec<Connection>,
    sessions: Vec<Session>,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    user_roles: Vec<(RecordId, RecordId)>,
    role_permissions: Vec<(RecordId, RecordId)>,
    notes: Vec<Note>,
    note_images: Vec<(RecordId, StoredImage)>,
    user_images: Vec<(RecordId, StoredImage)>,
    verifications: HashMap<(String, VerificationKind), Verification>,
}

/// One in-memory store implementing every repository port.
#[derive(Default)]
pub struct MemoryRepository {
    store: Mutex<Store>,
}

impl MemoryRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct role creation for test arrangement.
    pub fn add_role(&self, name: &str) -> RecordId {
        let role = Role::create(name, "");
        let id = role.id.clone();
        self.store.lock().expect("store lock").roles.push(role);
        id
    }

    /// Direct permission creation for test arrangement.
    pub fn add_permission(&self, action: &str, entity: &str, access: &str) -> RecordId {
        let permission = Permission::create(action, entity, access);
        let id = permission.id.clone();
        self.store
            .lock()
            .expect("store lock")
            .permissions
            .push(permission);
        id
    }

    /// Direct role assignment for test arrangement.
    pub fn assign_role_directly(&self, user_id: &RecordId, role_id: &RecordId) {
        self.store
            .lock()
            .expect("store lock")
            .user_roles
            .push((user_id.clone(), role_id.clone()));
    }

    /// Direct permission grant for test arrangement.
    pub fn grant_permission_directly(&self, role_id: &RecordId, permission_id: &RecordId) {
        self.store
            .lock()
            .expect("store lock")
            .role_permissions
            .push((role_id.clone(), permission_id.clone()));
    }

    /// Counts used by seeding assertions: (roles, users, passwords,
    /// assignments, notes).
    pub fn seed_counts(&self) -> (usize, usize, usize, usize, usize) {
        let store = self.store.lock().expect("store lock");
        (
            store.roles.len(),
            store.users.len(),
            store.passwords.len(),
            store.user_roles.len(),
            store.notes.len(),
        )
    }

    /// Look up a user by username, for test assertions.
    pub fn user_by_username(&self, username: &str) -> Option<User> {
        let store = self.store.lock().expect("store lock");
        store
            .users
            .iter()
            .find(|u| u.username.as_ref() == username)
            .cloned()
    }

    /// All notes owned by a user, for test assertions.
    pub fn notes_of(&self, owner_id: &RecordId) -> Vec<Note> {
        let store = self.store.lock().expect("store lock");
        store
            .notes
            .iter()
            .filter(|n| &n.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Role names assigned to a user, for test assertions.
    pub fn role_names_of(&self, user_id: &RecordId) -> Vec<String> {
        let store = self.store.lock().expect("store lock");
        let mut names: Vec<String> = store
            .user_roles
            .iter()
            .filter(|(uid, _)| uid == user_id)
            .filter_map(|(_, rid)| {
                store
                    .roles
                    .iter()
                    .find(|role| &role.id == rid)
                    .map(|role| role.name.clone())
            })
            .collect();
        names.sort();
        names
    }

    /// Whether any row still references the user id, for cascade assertions.
    pub fn has_rows_referencing(&self, user_id: &RecordId) -> bool {
        let store = self.store.lock().expect("store lock");
        let owned_note_ids: Vec<&RecordId> = store
            .notes
            .iter()
            .filter(|n| &n.owner_id == user_id)
            .map(|n| &n.id)
            .collect();
        store.passwords.contains_key(user_id.as_ref())
            || store.sessions.iter().any(|s| &s.user_id == user_id)
            || store.connections.iter().any(|c| &c.user_id == user_id)
            || store.user_roles.iter().any(|(uid, _)| uid == user_id)
            || store.user_images.iter().any(|(uid, _)| uid == user_id)
            || !owned_note_ids.is_empty()
            || store
                .note_images
                .iter()
                .any(|(nid, _)| owned_note_ids.contains(&nid))
    }
}

fn latest_note_activity(store: &Store, user_id: &RecordId) -> Option<DateTime<Utc>> {
    store
        .notes
        .iter()
        .filter(|n| &n.owner_id == user_id)
        .map(|n| n.updated_at)
        .max()
}

#[async_trait]
impl AccountRepository for MemoryRepository {
    async fn create_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().expect("store lock");
        if store.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::duplicate("users_email_key"));
        }
        if store.users.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::duplicate("users_username_key"));
        }
        store.users.push(user.clone());
        Ok(())
    }

    async fn create_password(
        &self,
        user_id: &RecordId,
        hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().expect("store lock");
        if store.passwords.contains_key(user_id.as_ref()) {
            return Err(RepositoryError::duplicate("passwords_user_id_key"));
        }
        store
            .passwords
            .insert(user_id.as_ref().to_owned(), hash.to_owned());
        Ok(())
    }

    async fn update_password(
        &self,
        user_id: &RecordId,
        hash: &str,
    ) -> Result<bool, RepositoryError> {
        let mut store = self.store.lock().expect("store lock");
        match store.passwords.get_mut(user_id.as_ref()) {
            Some(stored) => {
                *stored = hash.to_owned();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_connection(&self, connection: &Connection) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().expect("store lock");
        if store.connections.iter().any(|c| {
            c.provider_name == connection.provider_name && c.provider_id == connection.provider_id
        }) {
            return Err(RepositoryError::duplicate("connections_provider_name_id"));
        }
        store.connections.push(connection.clone());
        Ok(())
    }

    async fn find_connection(
        &self,
        provider_name: &str,
        provider_id: &str,
    ) -> Result<Option<Connection>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        Ok(store
            .connections
            .iter()
            .find(|c| c.provider_name == provider_name && c.provider_id == provider_id)
            .cloned())
    }

    async fn find_user_by_id(&self, id: &RecordId) -> Result<Option<User>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        Ok(store.users.iter().find(|u| &u.id == id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        Ok(store.users.iter().find(|u| &u.username == username).cloned())
    }

    async fn find_user_by_username_or_email(
        &self,
        target: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        Ok(store
            .users
            .iter()
            .find(|u| u.username.as_ref() == target || u.email.as_ref() == target)
            .cloned())
    }

    async fn find_user_with_password(
        &self,
        lookup: &UserLookup,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        let user = match lookup {
            UserLookup::Username(username) => {
                store.users.iter().find(|u| &u.username == username)
            }
            UserLookup::Id(id) => store.users.iter().find(|u| &u.id == id),
        };
        Ok(user.map(|u| (u.clone(), store.passwords.get(u.id.as_ref()).cloned())))
    }

    async fn search_users(&self, term: &str) -> Result<Vec<UserListing>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        let needle = term.to_lowercase();
        let mut matches: Vec<(&User, Option<DateTime<Utc>>)> = store
            .users
            .iter()
            .filter(|u| {
                u.username.as_ref().contains(&needle)
                    || u.name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .map(|u| (u, latest_note_activity(&store, &u.id)))
            .collect();
        matches.sort_by(|(_, a), (_, b)| b.cmp(a));
        Ok(matches
            .into_iter()
            .take(50)
            .map(|(u, _)| UserListing {
                id: u.id.clone(),
                username: u.username.clone(),
                name: u.name.clone(),
                image_id: store
                    .user_images
                    .iter()
                    .find(|(uid, _)| uid == &u.id)
                    .map(|(_, image)| image.id.clone()),
            })
            .collect())
    }

    async fn delete_user(&self, id: &RecordId) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().expect("store lock");
        let owned: Vec<RecordId> = store
            .notes
            .iter()
            .filter(|n| &n.owner_id == id)
            .map(|n| n.id.clone())
            .collect();
        store.users.retain(|u| &u.id != id);
        store.passwords.remove(id.as_ref());
        store.sessions.retain(|s| &s.user_id != id);
        store.connections.retain(|c| &c.user_id != id);
        store.user_roles.retain(|(uid, _)| uid != id);
        store.user_images.retain(|(uid, _)| uid != id);
        store.notes.retain(|n| &n.owner_id != id);
        store.note_images.retain(|(nid, _)| !owned.contains(nid));
        Ok(())
    }

    async fn set_user_image(
        &self,
        user_id: &RecordId,
        image: &NewImage,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().expect("store lock");
        store.user_images.retain(|(uid, _)| uid != user_id);
        store
            .user_images
            .push((user_id.clone(), StoredImage::from_new(image)));
        Ok(())
    }

    async fn find_user_image(
        &self,
        image_id: &RecordId,
    ) -> Result<Option<ImageData>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        Ok(store
            .user_images
            .iter()
            .find(|(_, image)| &image.id == image_id)
            .map(|(_, image)| image.data()))
    }

    async fn export_user_data(
        &self,
        id: &RecordId,
    ) -> Result<Option<UserExport>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        let Some(user) = store.users.iter().find(|u| &u.id == id).cloned() else {
            return Ok(None);
        };
        let image = store
            .user_images
            .iter()
            .find(|(uid, _)| uid == id)
            .map(|(_, image)| image.metadata());
        let notes = store
            .notes
            .iter()
            .filter(|n| &n.owner_id == id)
            .map(|note| NoteExport {
                note: note.clone(),
                images: store
                    .note_images
                    .iter()
                    .filter(|(nid, _)| nid == &note.id)
                    .map(|(_, image)| image.metadata())
                    .collect(),
            })
            .collect();
        let sessions = store
            .sessions
            .iter()
            .filter(|s| &s.user_id == id)
            .cloned()
            .collect();
        Ok(Some(UserExport {
            user,
            image,
            notes,
            sessions,
            roles: Vec::new(),
        }))
    }
}

#[async_trait]
impl SessionRepository for MemoryRepository {
    async fn create(&self, session: &Session) -> Result<(), RepositoryError> {
        self.store
            .lock()
            .expect("store lock")
            .sessions
            .push(session.clone());
        Ok(())
    }

    async fn find(&self, id: &RecordId) -> Result<Option<Session>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        Ok(store.sessions.iter().find(|s| &s.id == id).cloned())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), RepositoryError> {
        self.store
            .lock()
            .expect("store lock")
            .sessions
            .retain(|s| &s.id != id);
        Ok(())
    }
}

#[async_trait]
impl AccessRepository for MemoryRepository {
    async fn has_permission(
        &self,
        user_id: &RecordId,
        spec: &PermissionSpec,
    ) -> Result<bool, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        let role_ids: Vec<&RecordId> = store
            .user_roles
            .iter()
            .filter(|(uid, _)| uid == user_id)
            .map(|(_, rid)| rid)
            .collect();
        Ok(store.permissions.iter().any(|p| {
            p.action == spec.action
                && p.entity == spec.entity
                && spec
                    .access
                    .as_ref()
                    .is_none_or(|scopes| scopes.contains(&p.access))
                && store
                    .role_permissions
                    .iter()
                    .any(|(rid, pid)| pid == &p.id && role_ids.contains(&rid))
        }))
    }

    async fn has_role(
        &self,
        user_id: &RecordId,
        role_name: &str,
    ) -> Result<bool, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        Ok(store.user_roles.iter().any(|(uid, rid)| {
            uid == user_id
                && store
                    .roles
                    .iter()
                    .any(|role| &role.id == rid && role.name == role_name)
        }))
    }

    async fn roles_for_user(&self, user_id: &RecordId) -> Result<Vec<Role>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        Ok(store
            .roles
            .iter()
            .filter(|role| {
                store
                    .user_roles
                    .iter()
                    .any(|(uid, rid)| uid == user_id && rid == &role.id)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NoteRepository for MemoryRepository {
    async fn create(&self, note: &Note) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().expect("store lock");
        if store.notes.iter().any(|n| n.id == note.id) {
            return Err(RepositoryError::duplicate("notes_pkey"));
        }
        store.notes.push(note.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: &RecordId,
        owner_id: &RecordId,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut store = self.store.lock().expect("store lock");
        match store
            .notes
            .iter_mut()
            .find(|n| &n.id == id && &n.owner_id == owner_id)
        {
            Some(note) => {
                note.title = title.to_owned();
                note.content = content.to_owned();
                note.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find(&self, id: &RecordId) -> Result<Option<Note>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        Ok(store.notes.iter().find(|n| &n.id == id).cloned())
    }

    async fn list_for_owner(&self, owner_id: &RecordId) -> Result<Vec<Note>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        let mut notes: Vec<Note> = store
            .notes
            .iter()
            .filter(|n| &n.owner_id == owner_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, RepositoryError> {
        let mut store = self.store.lock().expect("store lock");
        let existed = store.notes.iter().any(|n| &n.id == id);
        store.notes.retain(|n| &n.id != id);
        store.note_images.retain(|(nid, _)| nid != id);
        Ok(existed)
    }

    async fn attach_image(
        &self,
        note_id: &RecordId,
        image: &NewImage,
    ) -> Result<(), RepositoryError> {
        self.store
            .lock()
            .expect("store lock")
            .note_images
            .push((note_id.clone(), StoredImage::from_new(image)));
        Ok(())
    }

    async fn remove_images_except(
        &self,
        note_id: &RecordId,
        keep: &[RecordId],
    ) -> Result<(), RepositoryError> {
        self.store
            .lock()
            .expect("store lock")
            .note_images
            .retain(|(nid, image)| nid != note_id || keep.contains(&image.id));
        Ok(())
    }

    async fn list_images(
        &self,
        note_id: &RecordId,
    ) -> Result<Vec<ImageMetadata>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        Ok(store
            .note_images
            .iter()
            .filter(|(nid, _)| nid == note_id)
            .map(|(_, image)| image.metadata())
            .collect())
    }

    async fn find_image(
        &self,
        image_id: &RecordId,
    ) -> Result<Option<ImageData>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        Ok(store
            .note_images
            .iter()
            .find(|(_, image)| &image.id == image_id)
            .map(|(_, image)| image.data()))
    }
}

#[async_trait]
impl VerificationRepository for MemoryRepository {
    async fn upsert(&self, verification: &Verification) -> Result<(), RepositoryError> {
        self.store.lock().expect("store lock").verifications.insert(
            (verification.target.clone(), verification.kind),
            verification.clone(),
        );
        Ok(())
    }

    async fn find(
        &self,
        target: &str,
        kind: VerificationKind,
    ) -> Result<Option<Verification>, RepositoryError> {
        let store = self.store.lock().expect("store lock");
        Ok(store
            .verifications
            .get(&(target.to_owned(), kind))
            .cloned())
    }

    async fn delete(&self, target: &str, kind: VerificationKind) -> Result<(), RepositoryError> {
        self.store
            .lock()
            .expect("store lock")
            .verifications
            .remove(&(target.to_owned(), kind));
        Ok(())
    }
}

#[async_trait]
impl SeedRepository for MemoryRepository {
    async fn insert_role(&self, role: &Role) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().expect("store lock");
        if store.roles.iter().any(|r| r.name == role.name) {
            return Err(RepositoryError::duplicate("roles_name_key"));
        }
        store.roles.push(role.clone());
        Ok(())
    }

    async fn insert_permission(&self, permission: &Permission) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().expect("store lock");
        if store.permissions.iter().any(|p| {
            p.action == permission.action
                && p.entity == permission.entity
                && p.access == permission.access
        }) {
            return Err(RepositoryError::duplicate(
                "permissions_action_entity_access",
            ));
        }
        store.permissions.push(permission.clone());
        Ok(())
    }

    async fn grant_permission(
        &self,
        role_id: &RecordId,
        permission_id: &RecordId,
    ) -> Result<(), RepositoryError> {
        self.store
            .lock()
            .expect("store lock")
            .role_permissions
            .push((role_id.clone(), permission_id.clone()));
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), RepositoryError> {
        self.create_user(user).await
    }

    async fn insert_password(
        &self,
        user_id: &RecordId,
        hash: &str,
    ) -> Result<(), RepositoryError> {
        self.create_password(user_id, hash).await
    }

    async fn assign_role(
        &self,
        user_id: &RecordId,
        role_id: &RecordId,
    ) -> Result<(), RepositoryError> {
        self.store
            .lock()
            .expect("store lock")
            .user_roles
            .push((user_id.clone(), role_id.clone()));
        Ok(())
    }

    async fn insert_note(&self, note: &Note) -> Result<(), RepositoryError> {
        NoteRepository::create(self, note).await
    }
}

#[cfg(test)]
mod tests {
    //! The store must honour the schema semantics the tests above it lean on.
    use chrono::Utc;

    use super::*;
    use crate::domain::{Email, Session, User, Username};

    fn user(username: &str) -> User {
        User::create(
            Email::new(format!("{username}@example.com")).expect("valid email"),
            Username::new(username).expect("valid username"),
            None,
        )
    }

    #[tokio::test]
    async fn deleting_a_user_leaves_no_referencing_rows() {
        let store = MemoryRepository::new();
        let alice = user("alice");
        store.create_user(&alice).await.expect("insert user");
        store
            .create_password(&alice.id, "argon2-hash")
            .await
            .expect("insert password");
        SessionRepository::create(&store, &Session::create(alice.id.clone(), Utc::now()))
            .await
            .expect("insert session");
        store
            .create_connection(&Connection::create("github", "gh-1", alice.id.clone()))
            .await
            .expect("insert connection");
        let role = store.add_role("user");
        store.assign_role_directly(&alice.id, &role);
        let note = Note::create(alice.id.clone(), "t", "c");
        NoteRepository::create(&store, &note)
            .await
            .expect("insert note");
        store
            .attach_image(&note.id, &NewImage::from_upload(None, "image/png", vec![1]))
            .await
            .expect("attach note image");
        store
            .set_user_image(&alice.id, &NewImage::from_upload(None, "image/png", vec![2]))
            .await
            .expect("set user image");

        assert!(store.has_rows_referencing(&alice.id));
        store.delete_user(&alice.id).await.expect("delete user");
        assert!(!store.has_rows_referencing(&alice.id));
        assert!(store.user_by_username("alice").is_none());
    }

    #[tokio::test]
    async fn search_is_capped_at_fifty_rows() {
        let store = MemoryRepository::new();
        for i in 0..60 {
            store
                .create_user(&user(&format!("user{i:02}")))
                .await
                .expect("insert user");
        }
        let listings = store.search_users("").await.expect("search succeeds");
        assert_eq!(listings.len(), 50);
    }

    #[tokio::test]
    async fn duplicate_uniqueness_constraints_are_enforced() {
        let store = MemoryRepository::new();
        let alice = user("alice");
        store.create_user(&alice).await.expect("insert user");

        let mut same_email = user("alice2");
        same_email.email = Email::new("alice@example.com").expect("valid email");
        assert_eq!(
            store
                .create_user(&same_email)
                .await
                .expect_err("duplicate email must fail"),
            RepositoryError::duplicate("users_email_key")
        );

        store
            .create_connection(&Connection::create("github", "gh-1", alice.id.clone()))
            .await
            .expect("insert connection");
        assert_eq!(
            store
                .create_connection(&Connection::create("github", "gh-1", alice.id.clone()))
                .await
                .expect_err("duplicate provider pair must fail"),
            RepositoryError::duplicate("connections_provider_name_id")
        );

        store.add_permission("read", "note", "own");
        let duplicate = Permission::create("read", "note", "own");
        assert_eq!(
            store
                .insert_permission(&duplicate)
                .await
                .expect_err("duplicate permission triple must fail"),
            RepositoryError::duplicate("permissions_action_entity_access")
        );
    }
}
