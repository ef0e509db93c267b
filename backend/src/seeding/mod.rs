//! Operational seed scenario shared by the `seed` binary and its tests.
//!
//! Sibling inserts within a wave are issued concurrently and awaited
//! together; the only ordering guarantees are the structural ones — roles
//! exist before role assignments, users before passwords, assignments, and
//! notes.

use chrono::Utc;
use futures_util::future::try_join_all;
use tracing::info;

use demo_data::DemoDataGenerator;

use crate::domain::ports::SeedRepository;
use crate::domain::{
    Email, Error, Note, Password, Permission, RecordId, Role, User, Username, hash_password,
};

/// Fixed id of the well-known demo note.
pub const KOALA_NOTE_ID: &str = "d27a197e";
/// Title of the well-known demo note.
pub const KOALA_NOTE_TITLE: &str = "Basic Koala Facts";

const KODY_PASSWORD: &str = "kodylovesyou";

/// Actions making up the base permission set.
const ACTIONS: [&str; 4] = ["create", "read", "update", "delete"];
/// Entities making up the base permission set.
const ENTITIES: [&str; 2] = ["user", "note"];

/// Row counts produced by a seed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub roles: usize,
    pub permissions: usize,
    pub users: usize,
    pub notes: usize,
}

fn demo_user(username: &str, email: &str, name: &str) -> Result<User, Error> {
    Ok(User::create(
        Email::new(email).map_err(|err| Error::internal(format!("seed email: {err}")))?,
        Username::new(username).map_err(|err| Error::internal(format!("seed username: {err}")))?,
        Some(name.to_owned()),
    ))
}

fn seed_password(username: &str) -> Result<String, Error> {
    let plaintext = if username == "kody" {
        KODY_PASSWORD.to_owned()
    } else {
        format!("{username}pass")
    };
    let password = Password::new(plaintext)
        .map_err(|err| Error::internal(format!("seed password: {err}")))?;
    hash_password(&password)
}

/// Seed the canonical demo data set.
///
/// Creates the `admin`/`user` roles, the base permission grid, five
/// generated accounts plus "kody", passwords and a `user` role assignment
/// for all six, an additional `admin` assignment for kody, one to three
/// generated notes per non-kody account, and kody's fixed koala note.
pub async fn run_seed(repository: &dyn SeedRepository, seed: u64) -> Result<SeedSummary, Error> {
    info!(seed, "seeding demo data");

    // Roles and permissions first; everything else references them.
    let admin_role = Role::create("admin", "Administrator");
    let user_role = Role::create("user", "Regular user");
    try_join_all([
        repository.insert_role(&admin_role),
        repository.insert_role(&user_role),
    ])
    .await?;

    let permissions: Vec<Permission> = ACTIONS
        .iter()
        .flat_map(|action| {
            ENTITIES.iter().flat_map(|entity| {
                ["own", "any"]
                    .iter()
                    .map(|access| Permission::create(*action, *entity, *access))
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    try_join_all(permissions.iter().map(|p| repository.insert_permission(p))).await?;
    // The user role carries every :own grant, admin every :any grant.
    try_join_all(permissions.iter().map(|p| {
        let role_id = if p.access == "any" {
            &admin_role.id
        } else {
            &user_role.id
        };
        repository.grant_permission(role_id, &p.id)
    }))
    .await?;

    // Users: five generated accounts plus kody.
    let accounts = DemoDataGenerator::new(seed).accounts(5);
    let mut users: Vec<User> = accounts
        .iter()
        .map(|account| demo_user(&account.username, &account.email, &account.name))
        .collect::<Result<_, _>>()?;
    let kody = demo_user("kody", "kody@kcd.dev", "Kody")?;
    let kody_id = kody.id.clone();
    users.push(kody);
    try_join_all(users.iter().map(|user| repository.insert_user(user))).await?;

    // Passwords for all six, then role assignments.
    let hashes: Vec<(RecordId, String)> = users
        .iter()
        .map(|user| Ok((user.id.clone(), seed_password(user.username.as_ref())?)))
        .collect::<Result<_, Error>>()?;
    try_join_all(
        hashes
            .iter()
            .map(|(user_id, hash)| repository.insert_password(user_id, hash)),
    )
    .await?;

    let mut assignments: Vec<(&RecordId, &RecordId)> = users
        .iter()
        .map(|user| (&user.id, &user_role.id))
        .collect();
    assignments.push((&kody_id, &admin_role.id));
    try_join_all(
        assignments
            .iter()
            .map(|(user_id, role_id)| repository.assign_role(user_id, role_id)),
    )
    .await?;

    // Notes: the generated ones, plus kody's fixed koala note.
    let mut notes: Vec<Note> = Vec::new();
    for (account, user) in accounts.iter().zip(&users) {
        for demo_note in &account.notes {
            notes.push(Note::create(
                user.id.clone(),
                demo_note.title.clone(),
                demo_note.content.clone(),
            ));
        }
    }
    let koala_id =
        RecordId::new(KOALA_NOTE_ID).map_err(|err| Error::internal(format!("seed note id: {err}")))?;
    let now = Utc::now();
    notes.push(Note {
        id: koala_id,
        title: KOALA_NOTE_TITLE.to_owned(),
        content: "Koalas are found in the eucalyptus forests of eastern Australia.".to_owned(),
        owner_id: kody_id,
        created_at: now,
        updated_at: now,
    });
    try_join_all(notes.iter().map(|note| repository.insert_note(note))).await?;

    let summary = SeedSummary {
        roles: 2,
        permissions: permissions.len(),
        users: users.len(),
        notes: notes.len(),
    };
    info!(
        roles = summary.roles,
        permissions = summary.permissions,
        users = summary.users,
        notes = summary.notes,
        "demo data seeded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LoginCredentials;
    use crate::test_support::MemoryRepository;
    use demo_data::{NOTES_PER_ACCOUNT_MAX, NOTES_PER_ACCOUNT_MIN};

    #[tokio::test]
    async fn seed_creates_the_documented_scenario() {
        let store = MemoryRepository::new();
        let summary = run_seed(&store, 42).await.expect("seed succeeds");

        let (roles, users, passwords, assignments, notes) = store.seed_counts();
        assert_eq!(roles, 2);
        assert_eq!(users, 6);
        assert_eq!(passwords, 6);
        // Six `user` assignments plus kody's `admin`.
        assert_eq!(assignments, 7);

        let kody = store.user_by_username("kody").expect("kody exists");
        assert_eq!(kody.email.as_ref(), "kody@kcd.dev");
        assert_eq!(store.role_names_of(&kody.id), vec!["admin", "user"]);

        let kody_notes = store.notes_of(&kody.id);
        assert_eq!(kody_notes.len(), 1);
        assert_eq!(kody_notes[0].id.as_ref(), KOALA_NOTE_ID);
        assert_eq!(kody_notes[0].title, KOALA_NOTE_TITLE);

        // Total note count is the sum of per-user counts plus kody's one.
        assert_eq!(notes, summary.notes);
        let generated = notes - 1;
        assert!(generated >= 5 * NOTES_PER_ACCOUNT_MIN);
        assert!(generated <= 5 * NOTES_PER_ACCOUNT_MAX);
    }

    #[tokio::test]
    async fn seeded_credentials_authenticate() {
        use crate::domain::{Authenticator, ProviderRegistry};
        use std::sync::Arc;

        let store = Arc::new(MemoryRepository::new());
        run_seed(store.as_ref(), 7).await.expect("seed succeeds");

        let authenticator =
            Authenticator::new(store.clone(), store.clone(), ProviderRegistry::new());
        let session = authenticator
            .login(&LoginCredentials {
                username: Username::new("kody").expect("valid username"),
                password: Password::new(KODY_PASSWORD).expect("valid password"),
            })
            .await
            .expect("login call succeeds")
            .expect("seeded credentials accepted");

        let kody = store.user_by_username("kody").expect("kody exists");
        assert_eq!(session.user_id, kody.id);
    }

    #[tokio::test]
    async fn reseeding_the_same_store_hits_uniqueness() {
        let store = MemoryRepository::new();
        run_seed(&store, 1).await.expect("first seed succeeds");
        let err = run_seed(&store, 1).await.expect_err("second seed conflicts");
        assert_eq!(err.code, crate::domain::ErrorCode::Conflict);
    }
}
