//! Room store: creates, tracks, and evicts rooms.

use std::collections::HashMap;

use quizduel_protocol::{PlayerId, RoomId};
use rand::Rng;
use tokio::time::Instant;

use crate::room::spawn_room;
use crate::{
    DuelConfig, DuelState, RoomError, RoomHandle, SharedQuestionSource,
    SharedScoreSink,
};

/// Registry of live rooms and of which player is in which room.
///
/// A player is in at most one room at a time. Rooms are never persisted;
/// they live until removed or until they outlive the configured TTL.
pub struct RoomStore {
    rooms: HashMap<RoomId, RoomHandle>,

    /// Maps each player to the room they're currently in.
    player_rooms: HashMap<PlayerId, RoomId>,

    next_id: u64,
    config: DuelConfig,
    questions: SharedQuestionSource,
    scores: SharedScoreSink,
}

impl RoomStore {
    /// Creates an empty store. Every room it creates shares `config` and
    /// the two collaborators.
    pub fn new(
        config: DuelConfig,
        questions: SharedQuestionSource,
        scores: SharedScoreSink,
    ) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            next_id: 1,
            config,
            questions,
            scores,
        }
    }

    pub fn config(&self) -> &DuelConfig {
        &self.config
    }

    /// Creates a room for two players and spawns its actor.
    ///
    /// Expired rooms are evicted first. The starting turn is picked
    /// uniformly at random.
    ///
    /// # Errors
    /// - [`RoomError::SamePlayer`] if both entries are the same player
    /// - [`RoomError::AlreadyInRoom`] if either player is already in a room
    pub fn create(
        &mut self,
        players: [PlayerId; 2],
    ) -> Result<RoomHandle, RoomError> {
        self.evict_expired(Instant::now());

        for player in &players {
            if let Some(existing) = self.player_rooms.get(player) {
                return Err(RoomError::AlreadyInRoom(player.clone(), *existing));
            }
        }

        let room_id = RoomId(self.next_id);
        let first_turn = rand::rng().random_range(0..2);
        let state =
            DuelState::new(room_id, players, first_turn, self.config.clone())?;
        self.next_id += 1;

        let handle = spawn_room(
            state,
            self.questions.clone(),
            self.scores.clone(),
            self.config.channel_size,
        );
        for player in handle.players() {
            self.player_rooms.insert(player.clone(), room_id);
        }
        self.rooms.insert(room_id, handle.clone());

        let [first, second] = handle.players();
        tracing::info!(
            %room_id,
            %first,
            %second,
            turn = %handle.players()[first_turn],
            "room created"
        );
        Ok(handle)
    }

    fn is_expired(&self, handle: &RoomHandle, now: Instant) -> bool {
        now.saturating_duration_since(handle.created_at()) > self.config.room_ttl
    }

    /// Looks up a live room.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if the id is unknown
    /// - [`RoomError::Expired`] if the room outlived its TTL but hasn't
    ///   been evicted yet
    pub fn get(&self, room_id: RoomId) -> Result<&RoomHandle, RoomError> {
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        if self.is_expired(handle, Instant::now()) {
            return Err(RoomError::Expired(room_id));
        }
        Ok(handle)
    }

    /// Looks up a live room on behalf of one of its players.
    ///
    /// # Errors
    /// As [`get`](Self::get), plus [`RoomError::NotMember`].
    pub fn get_for(
        &self,
        room_id: RoomId,
        player: &PlayerId,
    ) -> Result<&RoomHandle, RoomError> {
        let handle = self.get(room_id)?;
        if !handle.is_member(player) {
            return Err(RoomError::NotMember(player.clone(), room_id));
        }
        Ok(handle)
    }

    /// The live room `player` is in, if any.
    pub fn room_of(&self, player: &PlayerId) -> Option<&RoomHandle> {
        let room_id = self.player_rooms.get(player)?;
        self.get(*room_id).ok()
    }

    /// Removes a room, frees both players, and stops its actor.
    pub fn remove(&mut self, room_id: RoomId) -> Option<RoomHandle> {
        let handle = self.rooms.remove(&room_id)?;
        self.player_rooms.retain(|_, rid| *rid != room_id);
        handle.close();
        tracing::info!(%room_id, phase = %handle.phase(), "room removed");
        Some(handle)
    }

    /// Removes every room older than the TTL, whatever its phase.
    ///
    /// Returns the evicted ids.
    pub fn evict_expired(&mut self, now: Instant) -> Vec<RoomId> {
        let expired: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|h| self.is_expired(h, now))
            .map(RoomHandle::room_id)
            .collect();

        for room_id in &expired {
            if let Some(handle) = self.rooms.remove(room_id) {
                handle.close();
            }
            self.player_rooms.retain(|_, rid| *rid != *room_id);
            tracing::info!(%room_id, "room evicted");
        }

        expired
    }

    /// Returns the number of rooms, expired or not.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }
}
