//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations exactly; Diesel uses them for
//! compile-time query validation and type-safe SQL generation. Cascade
//! behaviour lives in the migration DDL, not here.

diesel::table! {
    /// User accounts. Email and username are stored lowercase and unique.
    users (id) {
        id -> Text,
        email -> Text,
        username -> Text,
        name -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Password hashes, at most one per user.
    passwords (user_id) {
        hash -> Text,
        user_id -> Text,
    }
}

diesel::table! {
    /// Server-side sessions referenced by the client cookie.
    sessions (id) {
        id -> Text,
        expiration_date -> Timestamptz,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        user_id -> Text,
    }
}

diesel::table! {
    /// External identity-provider connections; (provider_name, provider_id)
    /// is unique.
    connections (id) {
        id -> Text,
        provider_name -> Text,
        provider_id -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        user_id -> Text,
    }
}

diesel::table! {
    /// Named grant bundles.
    roles (id) {
        id -> Text,
        name -> Text,
        description -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Atomic (action, entity, access) grants; the triple is unique.
    permissions (id) {
        id -> Text,
        action -> Text,
        entity -> Text,
        access -> Text,
        description -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// User-to-role junction with a composite primary key.
    user_roles (user_id, role_id) {
        user_id -> Text,
        role_id -> Text,
    }
}

diesel::table! {
    /// Role-to-permission junction with a composite primary key.
    role_permissions (role_id, permission_id) {
        role_id -> Text,
        permission_id -> Text,
    }
}

diesel::table! {
    /// Notes owned by users.
    notes (id) {
        id -> Text,
        title -> Text,
        content -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        owner_id -> Text,
    }
}

diesel::table! {
    /// Binary image attachments belonging to notes.
    note_images (id) {
        id -> Text,
        alt_text -> Nullable<Text>,
        content_type -> Text,
        blob -> Bytea,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        note_id -> Text,
    }
}

diesel::table! {
    /// Profile images, at most one per user.
    user_images (id) {
        id -> Text,
        alt_text -> Nullable<Text>,
        content_type -> Text,
        blob -> Bytea,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        user_id -> Text,
    }
}

diesel::table! {
    /// Verification challenges; (target, type) is unique.
    verifications (id) {
        id -> Text,
        created_at -> Timestamptz,
        #[sql_name = "type"]
        kind -> Text,
        target -> Text,
        secret -> Text,
        algorithm -> Text,
        digits -> Int4,
        period -> Int8,
        char_set -> Text,
        expires_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(passwords -> users (user_id));
diesel::joinable!(sessions -> users (user_id));
diesel::joinable!(connections -> users (user_id));
diesel::joinable!(user_roles -> users (user_id));
diesel::joinable!(user_roles -> roles (role_id));
diesel::joinable!(role_permissions -> roles (role_id));
diesel::joinable!(role_permissions -> permissions (permission_id));
diesel::joinable!(notes -> users (owner_id));
diesel::joinable!(note_images -> notes (note_id));
diesel::joinable!(user_images -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    passwords,
    sessions,
    connections,
    roles,
    permissions,
    user_roles,
    role_permissions,
    notes,
    note_images,
    user_images,
    verifications,
);
