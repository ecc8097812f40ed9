//! In-process room registry fanning parking events out to live sockets.
//!
//! Each connection registers a [`Subscriber`] and receives pre-encoded JSON
//! frames over an unbounded channel. Joining a room is idempotent. Sending to
//! a closed channel removes that subscriber, and a room with no subscribers
//! left is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;

use crate::domain::ParkingEvent;
use crate::domain::Room;
use crate::domain::ports::{EventPublishError, ParkingEventPublisher};

use super::messages::ServerMessage;

/// Opaque identifier of one connection inside the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Sending half handed to the registry when a connection joins a room.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: SubscriberId,
    sender: mpsc::UnboundedSender<Arc<str>>,
}

impl Subscriber {
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    next_id: AtomicU64,
    rooms: RwLock<HashMap<Room, Vec<Subscriber>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a subscriber and the receiver its connection drains.
    pub fn subscriber(&self) -> (Subscriber, mpsc::UnboundedReceiver<Arc<str>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        (Subscriber { id, sender }, receiver)
    }

    pub async fn join(&self, room: Room, subscriber: &Subscriber) {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(room).or_default();
        if members.iter().all(|member| member.id != subscriber.id) {
            members.push(subscriber.clone());
        }
    }

    pub async fn leave(&self, room: &Room, id: SubscriberId) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(room) {
            members.retain(|member| member.id != id);
            if members.is_empty() {
                rooms.remove(room);
            }
        }
    }

    /// Remove a connection from every room it joined.
    pub async fn leave_all(&self, id: SubscriberId) {
        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, members| {
            members.retain(|member| member.id != id);
            !members.is_empty()
        });
    }

    /// Deliver a frame to every live member of `room`, returning how many
    /// received it.
    pub async fn broadcast(&self, room: &Room, frame: Arc<str>) -> usize {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(room) else {
            return 0;
        };
        members.retain(|member| member.sender.send(Arc::clone(&frame)).is_ok());
        let delivered = members.len();
        if delivered == 0 {
            rooms.remove(room);
        }
        delivered
    }

    pub async fn member_count(&self, room: &Room) -> usize {
        self.rooms.read().await.get(room).map_or(0, Vec::len)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[async_trait]
impl ParkingEventPublisher for RoomRegistry {
    async fn publish(&self, event: &ParkingEvent) -> Result<(), EventPublishError> {
        let frame: Arc<str> = serde_json::to_string(&ServerMessage::from(event))
            .map_err(|error| EventPublishError::delivery(error.to_string()))?
            .into();
        for room in event.rooms() {
            let delivered = self.broadcast(&room, Arc::clone(&frame)).await;
            debug!(room = %room, delivered, "broadcast parking event");
        }
        Ok(())
    }
}
