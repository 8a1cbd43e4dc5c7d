use std::collections::HashSet;
use tether_core::{RoomId, UserId};

/// A named group whose members are offered to each other for pairwise connections.
#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    members: HashSet<UserId>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            members: HashSet::new(),
        }
    }

    pub fn insert(&mut self, user_id: UserId) -> bool {
        self.members.insert(user_id)
    }

    pub fn remove(&mut self, user_id: &UserId) -> bool {
        self.members.remove(user_id)
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.members.contains(user_id)
    }

    pub fn members(&self) -> impl Iterator<Item = &UserId> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
