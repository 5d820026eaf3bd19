//! In-memory chat service fake.
//!
//! Implements the `ChatService` contract against purely local state and
//! records every delegated call so tests can assert on the side effects
//! the controller produced. Cloning shares the underlying state, so a
//! test can hand one clone to the controller and keep another as probe.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use palaver_core::{
    ChatService, MembershipChange, MessageId, Room, RoomId, RoomOptions, ServiceError, UserId,
};

/// Record of one delegated call, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    /// `create_room` was invoked.
    CreateRoom {
        /// Requested room name.
        name: String,
    },
    /// `add_user_to_room` was invoked.
    AddUser {
        /// Member being added.
        user_id: UserId,
        /// Target room.
        room_id: RoomId,
    },
    /// `remove_user_from_room` was invoked.
    RemoveUser {
        /// Member being removed.
        user_id: UserId,
        /// Target room.
        room_id: RoomId,
    },
    /// `leave_room` was invoked.
    LeaveRoom {
        /// Room being left.
        room_id: RoomId,
    },
    /// `set_read_cursor` was invoked.
    SetReadCursor {
        /// Target room.
        room_id: RoomId,
        /// Persisted position.
        position: MessageId,
    },
    /// `send_message` was invoked.
    SendMessage {
        /// Target room.
        room_id: RoomId,
        /// Message body.
        body: String,
    },
    /// `subscribe_to_room` was invoked.
    Subscribe {
        /// Room whose stream was attached.
        room_id: RoomId,
    },
}

struct Inner {
    me: UserId,
    display_name: String,
    rooms: HashMap<RoomId, Room>,
    cursors: HashMap<RoomId, MessageId>,
    subscriptions: HashSet<RoomId>,
    calls: Vec<ServiceCall>,
    fail_next: Option<ServiceError>,
    next_room: u64,
    clock_ms: u64,
}

/// Shared-state in-memory implementation of `ChatService`.
#[derive(Clone)]
pub struct FakeChatService {
    inner: Arc<Mutex<Inner>>,
}

impl FakeChatService {
    /// Create a fake for the given authenticated user.
    pub fn new(me: impl Into<String>) -> Self {
        let me = me.into();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                display_name: me.clone(),
                me: UserId::new(me),
                rooms: HashMap::new(),
                cursors: HashMap::new(),
                subscriptions: HashSet::new(),
                calls: Vec::new(),
                fail_next: None,
                next_room: 0,
                clock_ms: 1_000,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a room the user already belongs to.
    pub fn seed_room(&self, room: Room) {
        let mut inner = self.lock();
        inner.rooms.insert(room.id.clone(), room);
    }

    /// Seed a server-known read cursor.
    pub fn seed_cursor(&self, room_id: RoomId, position: MessageId) {
        self.lock().cursors.insert(room_id, position);
    }

    /// Make the next delegated async operation fail with `error`.
    pub fn fail_next(&self, error: ServiceError) {
        self.lock().fail_next = Some(error);
    }

    /// Every delegated call so far, in order.
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.lock().calls.clone()
    }

    /// Number of attach calls issued for a room.
    pub fn subscribe_count(&self, room_id: &RoomId) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, ServiceCall::Subscribe { room_id: r } if r == room_id))
            .count()
    }

    /// The cursor the service currently holds for a room.
    pub fn cursor(&self, room_id: &RoomId) -> Option<MessageId> {
        self.lock().cursors.get(room_id).copied()
    }

    /// Whether the service still lists the user in a room.
    pub fn has_room(&self, room_id: &RoomId) -> bool {
        self.lock().rooms.contains_key(room_id)
    }

    fn take_failure(inner: &mut Inner) -> Result<(), ServiceError> {
        match inner.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChatService for FakeChatService {
    fn id(&self) -> UserId {
        self.lock().me.clone()
    }

    fn display_name(&self) -> String {
        self.lock().display_name.clone()
    }

    fn rooms(&self) -> Vec<Room> {
        self.lock().rooms.values().cloned().collect()
    }

    fn read_cursor(&self, room_id: &RoomId) -> Option<MessageId> {
        self.lock().cursors.get(room_id).copied()
    }

    async fn create_room(&self, options: RoomOptions) -> Result<Room, ServiceError> {
        let mut inner = self.lock();
        inner.calls.push(ServiceCall::CreateRoom { name: options.name.clone() });
        Self::take_failure(&mut inner)?;

        inner.next_room += 1;
        inner.clock_ms += 1;
        let id = RoomId::new(format!("room-{}", inner.next_room));
        let mut member_ids = vec![inner.me.clone()];
        member_ids.extend(options.add_user_ids);
        let room = Room {
            id: id.clone(),
            name: options.name,
            private: options.private,
            member_ids,
            created_at_ms: inner.clock_ms,
            last_activity_ms: inner.clock_ms,
        };
        inner.rooms.insert(id, room.clone());
        Ok(room)
    }

    async fn add_user_to_room(&self, change: MembershipChange) -> Result<Room, ServiceError> {
        let mut inner = self.lock();
        inner.calls.push(ServiceCall::AddUser {
            user_id: change.user_id.clone(),
            room_id: change.room_id.clone(),
        });
        Self::take_failure(&mut inner)?;

        let room = inner
            .rooms
            .get_mut(&change.room_id)
            .ok_or_else(|| ServiceError::UnknownRoom(change.room_id.clone()))?;
        if !room.member_ids.contains(&change.user_id) {
            room.member_ids.push(change.user_id);
        }
        Ok(room.clone())
    }

    async fn remove_user_from_room(&self, change: MembershipChange) -> Result<Room, ServiceError> {
        let mut inner = self.lock();
        inner.calls.push(ServiceCall::RemoveUser {
            user_id: change.user_id.clone(),
            room_id: change.room_id.clone(),
        });
        Self::take_failure(&mut inner)?;

        let room = inner
            .rooms
            .get_mut(&change.room_id)
            .ok_or_else(|| ServiceError::UnknownRoom(change.room_id.clone()))?;
        room.member_ids.retain(|member| *member != change.user_id);
        Ok(room.clone())
    }

    async fn leave_room(&self, room_id: &RoomId) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        inner.calls.push(ServiceCall::LeaveRoom { room_id: room_id.clone() });
        Self::take_failure(&mut inner)?;

        inner
            .rooms
            .remove(room_id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::UnknownRoom(room_id.clone()))
    }

    async fn set_read_cursor(
        &self,
        room_id: &RoomId,
        position: MessageId,
    ) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        inner
            .calls
            .push(ServiceCall::SetReadCursor { room_id: room_id.clone(), position });
        Self::take_failure(&mut inner)?;
        inner.cursors.insert(room_id.clone(), position);
        Ok(())
    }

    async fn send_message(&self, room_id: &RoomId, body: String) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        inner.calls.push(ServiceCall::SendMessage { room_id: room_id.clone(), body });
        Self::take_failure(&mut inner)?;
        Ok(())
    }

    async fn subscribe_to_room(&self, room_id: &RoomId) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        inner.calls.push(ServiceCall::Subscribe { room_id: room_id.clone() });
        Self::take_failure(&mut inner)?;
        inner.subscriptions.insert(room_id.clone());
        Ok(())
    }
}
