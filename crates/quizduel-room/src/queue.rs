//! The matchmaking waiting list.

use std::collections::VecDeque;

use quizduel_protocol::PlayerId;

/// FIFO list of players waiting for an opponent.
///
/// A player appears at most once. The two longest-waiting players are
/// always paired first.
#[derive(Debug, Default)]
pub struct MatchQueue {
    waiting: VecDeque<PlayerId>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `player` unless already waiting. Returns `true` if added.
    pub fn enqueue(&mut self, player: PlayerId) -> bool {
        if self.contains(&player) {
            return false;
        }
        tracing::debug!(%player, waiting = self.waiting.len() + 1, "player queued");
        self.waiting.push_back(player);
        true
    }

    /// Removes `player` if waiting. Returns `true` if removed.
    pub fn dequeue(&mut self, player: &PlayerId) -> bool {
        match self.position(player) {
            Some(index) => {
                self.waiting.remove(index);
                tracing::debug!(%player, "player dequeued");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.waiting.contains(player)
    }

    /// Zero-based place in line.
    pub fn position(&self, player: &PlayerId) -> Option<usize> {
        self.waiting.iter().position(|p| p == player)
    }

    /// Pops the two earliest players, or nothing if fewer than two wait.
    pub fn pop_pair(&mut self) -> Option<[PlayerId; 2]> {
        if self.waiting.len() < 2 {
            return None;
        }
        let first = self.waiting.pop_front()?;
        let second = self.waiting.pop_front()?;
        Some([first, second])
    }

    /// Puts a popped pair back at the head of the line, in order.
    pub fn requeue_front(&mut self, pair: [PlayerId; 2]) {
        let [first, second] = pair;
        for player in [second, first] {
            if !self.contains(&player) {
                self.waiting.push_front(player);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}
