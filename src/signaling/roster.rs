use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use super::messages::ServerMessage;

pub const ROOM_CAPACITY: usize = 2;

pub type PeerId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Joined; carries the peers that were already in the room.
    Joined(Vec<PeerId>),
    Full,
}

/// Live connections and which call room each one sits in.
///
/// Room membership is changed only through the room's map entry, so the
/// capacity check and the insert happen under one shard lock.
#[derive(Default)]
pub struct RoomRoster {
    rooms: DashMap<String, Vec<PeerId>>,
    peer_room: DashMap<PeerId, String>,
    peers: DashMap<PeerId, UnboundedSender<ServerMessage>>,
}

impl RoomRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, peer: PeerId, tx: UnboundedSender<ServerMessage>) {
        self.peers.insert(peer, tx);
    }

    /// Delivers to one peer. `false` if it is gone.
    pub fn send(&self, to: PeerId, msg: ServerMessage) -> bool {
        match self.peers.get(&to) {
            Some(tx) => tx.send(msg).is_ok(),
            None => false,
        }
    }

    pub fn join(&self, room_id: &str, peer: PeerId) -> JoinOutcome {
        let previous = self.peer_room.get(&peer).map(|r| r.value().clone());
        if let Some(previous) = previous.filter(|r| r != room_id) {
            self.leave_room(&previous, peer);
        }

        let mut members = self.rooms.entry(room_id.to_string()).or_default();
        if !members.contains(&peer) {
            if members.len() >= ROOM_CAPACITY {
                return JoinOutcome::Full;
            }
            members.push(peer);
        }
        let others = members.iter().copied().filter(|p| *p != peer).collect();
        drop(members);

        self.peer_room.insert(peer, room_id.to_string());
        JoinOutcome::Joined(others)
    }

    /// Forgets the connection and takes it out of its room.
    pub fn leave(&self, peer: PeerId) {
        self.peers.remove(&peer);
        if let Some((_, room_id)) = self.peer_room.remove(&peer) {
            self.leave_room(&room_id, peer);
        }
    }

    fn leave_room(&self, room_id: &str, peer: PeerId) {
        if let Some(mut members) = self.rooms.get_mut(room_id) {
            members.retain(|p| *p != peer);
        }
        self.rooms.remove_if(room_id, |_, members| members.is_empty());
    }

    #[cfg(test)]
    pub fn members(&self, room_id: &str) -> Vec<PeerId> {
        self.rooms
            .get(room_id)
            .map(|m| m.value().clone())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
