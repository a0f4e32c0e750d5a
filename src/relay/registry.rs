use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::connection::{Connection, ConnectionId, Role};

/// The set of live connections of a single role, keyed by connection id.
#[derive(Debug)]
pub struct Registry {
    role: Role,
    members: HashMap<ConnectionId, Connection>,
}

impl Registry {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            members: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn role(&self) -> Role {
        self.role
    }

    /// Inserts the connection. A second insert of the same id keeps the
    /// existing entry and returns `false`.
    pub fn add(&mut self, conn: Connection) -> bool {
        debug_assert_eq!(conn.role, self.role);
        match self.members.entry(conn.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(conn);
                true
            }
        }
    }

    /// Removes the connection if present. Racing double removals are fine.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<Connection> {
        self.members.remove(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.members.contains_key(id)
    }

    /// An owned copy of the current members. Later changes to the registry
    /// are not visible through it.
    pub fn snapshot(&self) -> Vec<Connection> {
        self.members.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
