//! The lobby: matchmaking queue and room store behind one owner.
//!
//! Pairing a player and registering their room must look atomic to every
//! other caller, otherwise two concurrent polls could pop the same player
//! or create two rooms for one pair. `Lobby` methods take `&mut self`; the
//! service keeps the single `Lobby` behind a mutex, so queue and registry
//! change together.

use quizduel_protocol::{PlayerId, RoomId};

use crate::{MatchQueue, RoomError, RoomHandle, RoomStore};

/// The outcome of a matchmaking poll.
#[derive(Debug, Clone)]
pub enum MatchAttempt {
    /// Still queued.
    Waiting,
    /// The caller is in this room, either just created or found again.
    Matched(RoomHandle),
}

pub struct Lobby {
    queue: MatchQueue,
    store: RoomStore,
}

impl Lobby {
    pub fn new(store: RoomStore) -> Self {
        Self {
            queue: MatchQueue::new(),
            store,
        }
    }

    pub fn queue(&self) -> &MatchQueue {
        &self.queue
    }

    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RoomStore {
        &mut self.store
    }

    /// Puts `player` in the waiting list.
    ///
    /// A player whose previous duel is finished gets that room released
    /// first. Returns `true` if the player was newly queued.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`] if the player's current duel is still
    /// running.
    pub fn enqueue(&mut self, player: &PlayerId) -> Result<bool, RoomError> {
        if let Some(handle) = self.store.room_of(player) {
            let room_id = handle.room_id();
            if !handle.phase().is_terminal() {
                return Err(RoomError::AlreadyInRoom(player.clone(), room_id));
            }
            self.store.remove(room_id);
        }
        Ok(self.queue.enqueue(player.clone()))
    }

    /// Takes `player` out of the waiting list. Returns `true` if they were
    /// queued.
    pub fn cancel(&mut self, player: &PlayerId) -> bool {
        self.queue.dequeue(player)
    }

    /// Polls matchmaking for `player`.
    ///
    /// 1. A player who already has a room gets it back; nothing else
    ///    changes.
    /// 2. Otherwise the player is queued (if not already) and, if two or
    ///    more are waiting, the two earliest are paired into a new room.
    /// 3. The caller is told `Matched` only if the room includes them; a
    ///    caller whose poll paired two earlier players keeps waiting.
    ///
    /// # Errors
    /// Room creation errors. The popped pair is put back at the front of
    /// the line.
    pub fn try_match(
        &mut self,
        player: &PlayerId,
    ) -> Result<MatchAttempt, RoomError> {
        if let Some(handle) = self.store.room_of(player) {
            return Ok(MatchAttempt::Matched(handle.clone()));
        }

        self.queue.enqueue(player.clone());
        let Some(pair) = self.queue.pop_pair() else {
            return Ok(MatchAttempt::Waiting);
        };

        let handle = match self.store.create(pair.clone()) {
            Ok(handle) => handle,
            Err(err) => {
                self.queue.requeue_front(pair);
                return Err(err);
            }
        };
        tracing::info!(
            room_id = %handle.room_id(),
            first = %pair[0],
            second = %pair[1],
            waiting = self.queue.len(),
            "players paired"
        );

        if handle.is_member(player) {
            Ok(MatchAttempt::Matched(handle))
        } else {
            Ok(MatchAttempt::Waiting)
        }
    }

    /// The room `room_id`, if it is live and `player` is one of its
    /// players.
    ///
    /// # Errors
    /// [`RoomError::NotFound`], [`RoomError::Expired`] or
    /// [`RoomError::NotMember`].
    pub fn room(
        &self,
        room_id: RoomId,
        player: &PlayerId,
    ) -> Result<RoomHandle, RoomError> {
        self.store.get_for(room_id, player).cloned()
    }
}
