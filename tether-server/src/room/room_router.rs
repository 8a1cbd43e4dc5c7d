use crate::room::Room;
use std::collections::{HashMap, HashSet};
use tether_core::{RoomId, UserId};
use tracing::{debug, info};

/// Room membership table. Rooms are created on first join and dropped once empty.
#[derive(Debug, Default)]
pub struct RoomRouter {
    rooms: HashMap<RoomId, Room>,
}

impl RoomRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `user_id` and returns the members that were already there.
    ///
    /// The result never contains `user_id` itself and carries no ordering.
    pub fn join(&mut self, room_id: RoomId, user_id: UserId) -> Vec<UserId> {
        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::new(room_id.clone())
        });

        let existing: Vec<UserId> = room
            .members()
            .filter(|member| **member != user_id)
            .cloned()
            .collect();

        if !room.insert(user_id.clone()) {
            debug!("{} re-joined room {}", user_id, room_id);
        }

        existing
    }

    /// Idempotent; returns whether `user_id` was actually a member.
    pub fn leave(&mut self, room_id: &RoomId, user_id: &UserId) -> bool {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };

        let removed = room.remove(user_id);
        if room.is_empty() {
            info!("Room {} is empty, dropping it", room_id);
            self.rooms.remove(room_id);
        }
        removed
    }

    pub fn members_of(&self, room_id: &RoomId) -> HashSet<UserId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().cloned().collect())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, user_id: &UserId) -> Vec<RoomId> {
        self.rooms
            .values()
            .filter(|room| room.contains(user_id))
            .map(|room| room.id.clone())
            .collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
