//! Roles, permissions, and the permission specifier grammar.
//!
//! A permission specifier string has the shape
//! `action:entity[:access,access…]`. The optional access list uses OR
//! semantics: a caller holds the permission if any one of their roles grants
//! it at any listed scope.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::id::RecordId;

/// Named grant bundle assigned to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(value_type = String)]
    pub id: RecordId,
    /// Unique role name, e.g. `admin`.
    pub name: String,
    pub description: String,
}

impl Role {
    /// Build a role with a generated id.
    pub fn create(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: RecordId::random(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Atomic grant of an action on an entity at an access scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[schema(value_type = String)]
    pub id: RecordId,
    /// Verb, e.g. `create`, `read`, `update`, `delete`.
    pub action: String,
    /// Subject, e.g. `user`, `note`.
    pub entity: String,
    /// Scope, e.g. `own` or `any`.
    pub access: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// Build a permission with a generated id and current timestamps.
    pub fn create(
        action: impl Into<String>,
        entity: impl Into<String>,
        access: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::random(),
            action: action.into(),
            entity: entity.into(),
            access: access.into(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Errors produced when parsing a permission specifier string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionSpecError {
    /// The action segment was missing or empty.
    #[error("permission specifier is missing an action")]
    MissingAction,
    /// The entity segment was missing or empty.
    #[error("permission specifier is missing an entity")]
    MissingEntity,
    /// The access list was present but contained an empty entry.
    #[error("permission specifier has an empty access entry")]
    EmptyAccess,
}

/// Parsed permission specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSpec {
    pub action: String,
    pub entity: String,
    /// Optional access scopes; `None` matches any access value.
    pub access: Option<Vec<String>>,
}

impl PermissionSpec {
    /// Construct a specifier without an access restriction.
    pub fn of(action: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            entity: entity.into(),
            access: None,
        }
    }

    /// Restrict the specifier to the given access scopes.
    #[must_use]
    pub fn with_access<I, S>(mut self, access: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access = Some(access.into_iter().map(Into::into).collect());
        self
    }
}

impl FromStr for PermissionSpec {
    type Err = PermissionSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.splitn(3, ':');
        let action = segments.next().unwrap_or_default();
        if action.is_empty() {
            return Err(PermissionSpecError::MissingAction);
        }
        let entity = segments.next().unwrap_or_default();
        if entity.is_empty() {
            return Err(PermissionSpecError::MissingEntity);
        }
        let access = match segments.next() {
            None => None,
            Some(list) => {
                let scopes: Vec<String> = list.split(',').map(str::to_owned).collect();
                if scopes.iter().any(String::is_empty) {
                    return Err(PermissionSpecError::EmptyAccess);
                }
                Some(scopes)
            }
        };
        Ok(Self {
            action: action.to_owned(),
            entity: entity.to_owned(),
            access,
        })
    }
}

impl fmt::Display for PermissionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.entity)?;
        if let Some(access) = &self.access {
            write!(f, ":{}", access.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("read:note", "read", "note", None)]
    #[case("delete:note:any", "delete", "note", Some(vec!["any"]))]
    #[case("update:user:own,any", "update", "user", Some(vec!["own", "any"]))]
    fn parses_specifier_segments(
        #[case] raw: &str,
        #[case] action: &str,
        #[case] entity: &str,
        #[case] access: Option<Vec<&str>>,
    ) {
        let spec: PermissionSpec = raw.parse().expect("valid specifier");
        assert_eq!(spec.action, action);
        assert_eq!(spec.entity, entity);
        assert_eq!(
            spec.access,
            access.map(|scopes| scopes.into_iter().map(str::to_owned).collect::<Vec<_>>())
        );
    }

    #[rstest]
    #[case("", PermissionSpecError::MissingAction)]
    #[case(":note", PermissionSpecError::MissingAction)]
    #[case("read:", PermissionSpecError::MissingEntity)]
    #[case("read", PermissionSpecError::MissingEntity)]
    #[case("read:note:own,", PermissionSpecError::EmptyAccess)]
    fn rejects_malformed_specifiers(#[case] raw: &str, #[case] expected: PermissionSpecError) {
        assert_eq!(
            raw.parse::<PermissionSpec>().expect_err("must fail"),
            expected
        );
    }

    #[rstest]
    #[case("read:note")]
    #[case("delete:note:own,any")]
    fn display_round_trips(#[case] raw: &str) {
        let spec: PermissionSpec = raw.parse().expect("valid specifier");
        assert_eq!(spec.to_string(), raw);
    }
}
