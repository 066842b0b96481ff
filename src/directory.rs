use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::engine::workflow::Actor;
use crate::error::CoreError;
use crate::model::role::{Department, Role};

/// One entry of the user directory collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryUser {
    pub id: u64,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub department: Option<Department>,
}

/// Read-only identity/role lookups. Authentication itself lives in the host
/// service; this core only needs to know who holds which role and which
/// staff pool a department maps to. Loaded once at startup from a JSON file.
#[derive(Debug, Clone)]
pub struct Directory {
    users: HashMap<u64, DirectoryUser>,
}

impl Directory {
    pub fn from_users(users: Vec<DirectoryUser>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading directory file {}", path.display()))?;
        let users: Vec<DirectoryUser> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing directory file {}", path.display()))?;
        Ok(Self::from_users(users))
    }

    pub fn role_of(&self, user_id: u64) -> Option<Role> {
        self.users.get(&user_id).map(|u| u.role)
    }

    /// Resolves an actor for a transition; unknown users are rejected before
    /// the state machine is ever consulted.
    pub fn actor(&self, user_id: u64) -> Result<Actor, CoreError> {
        self.role_of(user_id)
            .map(|role| Actor { id: user_id, role })
            .ok_or_else(|| CoreError::Forbidden(format!("user {user_id} is not in the directory")))
    }

    /// Staff members of `department`, id-ordered so routing assignment is
    /// deterministic.
    pub fn staff_pool(&self, department: Department) -> Vec<u64> {
        let mut pool: Vec<u64> = self
            .users
            .values()
            .filter(|u| u.role == Role::Staff && u.department == Some(department))
            .map(|u| u.id)
            .collect();
        pool.sort_unstable();
        pool
    }
}
