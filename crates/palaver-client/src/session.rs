//! Session controller.
//!
//! Top-level orchestrator owning every piece of mutable session state.
//! All mutations go through the operations here: user actions are async
//! methods that may delegate to the [`ChatService`] handle, and inbound
//! transport events go through [`SessionController::apply`], the single
//! processing point of the event stream. External collaborators only
//! ever read the [`Snapshot`].
//!
//! # Concurrency
//!
//! Single-threaded and cooperative: operations take `&mut self`, so no
//! two mutations of the same state overlap. A delegated request may
//! suspend, and events for unrelated rooms may interleave before it
//! completes; every operation touches state only after its own await
//! resolves, so arbitrary interleaving of unrelated keys is safe.

use std::fmt;

use palaver_core::{
    ChatService, CursorTracker, MembershipChange, Message, MessageId, MessageStore, Room,
    RoomDirectory, RoomId, RoomOptions, TypingRegistry, UserId,
};

use crate::{
    command::Command,
    error::SessionError,
    event::{InboundEvent, SessionEffect},
    subscription::SubscriptionManager,
};

/// Transient navigation flags mirrored into the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiFlags {
    /// Room-list sidebar open. Cleared whenever a room is opened.
    pub sidebar_open: bool,
    /// Member-list panel open.
    pub user_list_open: bool,
}

/// Read-only view handed to the presentation layer.
///
/// The presentation layer never mutates state; everything it shows is
/// read from here or from the derived queries on the controller.
#[derive(Debug)]
pub struct Snapshot<'a> {
    /// Identifier of the active user, if any.
    pub user: Option<UserId>,
    /// Display name of the active user.
    pub display_name: Option<String>,
    /// The currently open room.
    pub room: Option<&'a Room>,
    /// All held messages, per room in identifier order.
    pub messages: &'a MessageStore,
    /// Currently composing users per room.
    pub typing: &'a TypingRegistry,
    /// Transient navigation flags.
    pub ui: UiFlags,
}

/// Session controller: the state-synchronization core.
pub struct SessionController<S: ChatService> {
    /// Authenticated user handle. Absent until [`Self::set_user`].
    service: Option<S>,
    /// Rooms the user belongs to (local copy).
    directory: RoomDirectory,
    /// Per-room message history held for the session.
    messages: MessageStore,
    /// Per-room, per-user read positions.
    cursors: CursorTracker,
    /// Per-room composing users.
    typing: TypingRegistry,
    /// Per-room attach state.
    subscriptions: SubscriptionManager,
    /// The room currently open in the presentation layer.
    current_room: Option<RoomId>,
    /// Transient navigation flags.
    ui: UiFlags,
}

impl<S: ChatService> SessionController<S> {
    /// Create a controller with no active user.
    ///
    /// Until [`Self::set_user`] is called every delegating operation
    /// fails with [`SessionError::NoActiveUser`] and every inbound event
    /// is dropped.
    pub fn new() -> Self {
        Self {
            service: None,
            directory: RoomDirectory::new(),
            messages: MessageStore::new(),
            cursors: CursorTracker::new(),
            typing: TypingRegistry::new(),
            subscriptions: SubscriptionManager::new(),
            current_room: None,
            ui: UiFlags::default(),
        }
    }

    // ------------------------------------------------------------------
    // User
    // ------------------------------------------------------------------

    /// Replace the active user and run the resubscription pass over the
    /// new user's rooms.
    ///
    /// Seeds the room directory and read cursors from the handle, then
    /// ensures a live subscription for every room. Attach failures are
    /// absorbed into the diagnostic sink; the affected room can be
    /// retried on a later join.
    pub async fn set_user(&mut self, service: S) {
        self.service = Some(service);
        self.directory = RoomDirectory::new();
        self.subscriptions = SubscriptionManager::new();
        self.current_room = None;

        let Some(svc) = self.service.as_ref() else {
            return;
        };
        let me = svc.id();
        for room in svc.rooms() {
            if let Some(position) = svc.read_cursor(&room.id) {
                self.cursors.advance(&room.id, &me, position);
            }
            self.directory.upsert(room);
        }

        let room_ids: Vec<RoomId> = self.directory.ids().cloned().collect();
        for room_id in &room_ids {
            Self::ensure_subscribed(svc, &mut self.subscriptions, room_id).await;
        }
    }

    // ------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------

    /// Open a room: make it current, clear the sidebar, ensure a live
    /// subscription, and mark everything currently known as read.
    ///
    /// If the store already holds messages for the room, the cursor
    /// advances to the highest known identifier (never backwards). A room
    /// with no messages leaves the cursor untouched.
    pub async fn join_room(&mut self, room: Room) -> Result<Vec<SessionEffect>, SessionError> {
        let svc = self.service.as_ref().ok_or(SessionError::NoActiveUser)?;
        let me = svc.id();
        let room_id = room.id.clone();

        self.directory.upsert(room);
        self.current_room = Some(room_id.clone());
        self.ui.sidebar_open = false;

        Self::ensure_subscribed(svc, &mut self.subscriptions, &room_id).await;

        if let Some(latest) = self.messages.latest(&room_id) {
            if let Some(position) = self.cursors.advance(&room_id, &me, latest) {
                svc.set_read_cursor(&room_id, position).await?;
            }
        }

        Ok(vec![SessionEffect::ScrollToLatest, SessionEffect::Refresh])
    }

    /// Create a room through the service and open it.
    ///
    /// No local state is touched until the service confirms; a failure is
    /// returned to the caller with nothing to roll back.
    pub async fn create_room(
        &mut self,
        options: RoomOptions,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let svc = self.service.as_ref().ok_or(SessionError::NoActiveUser)?;
        let room = svc.create_room(options).await?;
        self.join_room(room).await
    }

    /// Open or create the private conversation with another user.
    ///
    /// The conversation key is order-independent: a room created by
    /// either participant is found under either concatenation of the
    /// pair. Targeting yourself is a silent no-op.
    pub async fn create_conversation(
        &mut self,
        target: &UserId,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let svc = self.service.as_ref().ok_or(SessionError::NoActiveUser)?;
        let me = svc.id();
        if *target == me {
            tracing::debug!(user = %me, "conversation with self ignored");
            return Ok(Vec::new());
        }

        if let Some(existing) = self.directory.find_conversation(&me, target).cloned() {
            return self.join_room(existing).await;
        }

        self.create_room(RoomOptions {
            name: RoomDirectory::conversation_name(&me, target),
            private: true,
            add_user_ids: vec![target.clone()],
        })
        .await
    }

    /// Clear the current room locally after a server-confirmed leave or
    /// removal. Does not contact the service.
    pub fn remove_room(&mut self, room_id: &RoomId) -> Vec<SessionEffect> {
        if self.current_room.as_ref() == Some(room_id) {
            self.current_room = None;
        }
        self.directory.remove(room_id);
        vec![SessionEffect::Refresh]
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Add a member to a room through the service and refresh the local
    /// room snapshot on success.
    pub async fn add_user_to_room(
        &mut self,
        change: MembershipChange,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let svc = self.service.as_ref().ok_or(SessionError::NoActiveUser)?;
        let room = svc.add_user_to_room(change).await?;
        self.directory.upsert(room);
        Ok(vec![SessionEffect::Refresh])
    }

    /// Remove a member from a room.
    ///
    /// Removing yourself is a different server operation: it is routed to
    /// the leave endpoint and the local room copy is dropped.
    pub async fn remove_user_from_room(
        &mut self,
        change: MembershipChange,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let svc = self.service.as_ref().ok_or(SessionError::NoActiveUser)?;
        if change.user_id == svc.id() {
            svc.leave_room(&change.room_id).await?;
            return Ok(self.remove_room(&change.room_id));
        }
        let room = svc.remove_user_from_room(change).await?;
        self.directory.upsert(room);
        Ok(vec![SessionEffect::Refresh])
    }

    // ------------------------------------------------------------------
    // Cursors
    // ------------------------------------------------------------------

    /// Record the read cursor for a room from a user-supplied position.
    ///
    /// The position is validated at ingestion: it must parse as an
    /// integer identifier. The recorded value is clamped to the monotonic
    /// maximum, so a stale position never moves a cursor backwards and is
    /// not persisted.
    pub async fn set_cursor(
        &mut self,
        room_id: &RoomId,
        position: &str,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let svc = self.service.as_ref().ok_or(SessionError::NoActiveUser)?;
        let position: MessageId = position.parse()?;
        let me = svc.id();
        if let Some(advanced) = self.cursors.advance(room_id, &me, position) {
            svc.set_read_cursor(room_id, advanced).await?;
        }
        Ok(vec![SessionEffect::Refresh])
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Send a message to the current room.
    ///
    /// The message itself arrives back through the event stream like any
    /// other inbound message; nothing is inserted optimistically.
    pub async fn send_message(&self, body: impl Into<String> + Send) -> Result<(), SessionError> {
        let svc = self.service.as_ref().ok_or(SessionError::NoActiveUser)?;
        let room_id = self.current_room.clone().ok_or(SessionError::NoCurrentRoom)?;
        svc.send_message(&room_id, body.into()).await?;
        Ok(())
    }

    /// Apply an inbound transport event.
    ///
    /// This is the single processing point for the event stream. It never
    /// fails: delegation errors raised while reacting to an event are
    /// logged and absorbed, so one bad event cannot stall the loop.
    pub async fn apply(&mut self, event: InboundEvent) -> Vec<SessionEffect> {
        match event {
            InboundEvent::NewMessage(message) => self.apply_new_message(message).await,
            InboundEvent::TypingStarted { room, user } => {
                self.is_typing(&room, &user);
                vec![SessionEffect::Refresh]
            },
            InboundEvent::TypingStopped { room, user } => {
                self.not_typing(&room, &user);
                vec![SessionEffect::Refresh]
            },
            InboundEvent::PresenceChanged => self.set_user_presence(),
        }
    }

    async fn apply_new_message(&mut self, message: Message) -> Vec<SessionEffect> {
        let room_id = message.room.clone();
        if !self.subscriptions.is_subscribed(&room_id) {
            tracing::debug!(room = %room_id, id = %message.id, "message for unsubscribed room dropped");
            return Vec::new();
        }

        let message_id = message.id;
        let timestamp_ms = message.timestamp_ms;
        self.messages.insert(message);
        self.directory.touch(&room_id, timestamp_ms);

        let mut effects = vec![SessionEffect::Refresh];
        if self.current_room.as_ref() == Some(&room_id) {
            // Arriving in the open room counts as read
            if let Some(svc) = self.service.as_ref() {
                let me = svc.id();
                if let Some(position) = self.cursors.advance(&room_id, &me, message_id) {
                    if let Err(error) = svc.set_read_cursor(&room_id, position).await {
                        tracing::warn!(room = %room_id, %error, "cursor persist failed");
                    }
                }
            }
            effects.push(SessionEffect::ScrollToLatest);
        }
        effects
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Dispatch a chat-input command against the current room.
    ///
    /// Unrecognized commands are silently ignored so ordinary chat text
    /// can share this path. Failures from the delegated operation go to
    /// the diagnostic sink, never to the caller.
    pub async fn run_command(&mut self, text: &str) -> Vec<SessionEffect> {
        let Some(command) = Command::parse(text) else {
            return Vec::new();
        };
        let Some(room_id) = self.current_room.clone() else {
            tracing::debug!(?command, "command ignored: no open room");
            return Vec::new();
        };

        let result = match command {
            Command::Invite(user_id) => {
                self.add_user_to_room(MembershipChange { user_id, room_id }).await
            },
            Command::Remove(user_id) => {
                self.remove_user_from_room(MembershipChange { user_id, room_id }).await
            },
            Command::Leave => {
                let me = self.service.as_ref().map(ChatService::id);
                match me {
                    Some(me) => {
                        self.remove_user_from_room(MembershipChange { user_id: me, room_id })
                            .await
                    },
                    None => Err(SessionError::NoActiveUser),
                }
            },
        };

        match result {
            Ok(effects) => effects,
            Err(error) => {
                tracing::warn!(%error, "command failed");
                Vec::new()
            },
        }
    }

    // ------------------------------------------------------------------
    // Typing indicators
    // ------------------------------------------------------------------

    /// Record that a user is composing in a room. Idempotent.
    pub fn is_typing(&mut self, room: &RoomId, user: &UserId) {
        self.typing.start(room, user);
    }

    /// Clear a composing entry. Clearing an absent entry is idempotent.
    pub fn not_typing(&mut self, room: &RoomId, user: &UserId) {
        self.typing.stop(room, user);
    }

    // ------------------------------------------------------------------
    // Presence
    // ------------------------------------------------------------------

    /// Externally tracked presence changed. Nothing is stored here; the
    /// presentation layer re-reads presence from the service on refresh.
    pub fn set_user_presence(&self) -> Vec<SessionEffect> {
        vec![SessionEffect::Refresh]
    }

    // ------------------------------------------------------------------
    // UI flags
    // ------------------------------------------------------------------

    /// Toggle the room-list sidebar.
    pub fn set_sidebar(&mut self, open: bool) {
        self.ui.sidebar_open = open;
    }

    /// Toggle the member-list panel.
    pub fn set_user_list(&mut self, open: bool) {
        self.ui.user_list_open = open;
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    /// Read-only view for the presentation layer.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            user: self.service.as_ref().map(ChatService::id),
            display_name: self.service.as_ref().map(ChatService::display_name),
            room: self.current_room.as_ref().and_then(|id| self.directory.get(id)),
            messages: &self.messages,
            typing: &self.typing,
            ui: self.ui,
        }
    }

    /// Rooms ordered by most recent activity.
    pub fn rooms_by_activity(&self) -> Vec<&Room> {
        self.directory.by_activity()
    }

    /// Messages in a room above the active user's read cursor.
    pub fn unread_count(&self, room_id: &RoomId) -> usize {
        let cursor = self
            .service
            .as_ref()
            .map(ChatService::id)
            .and_then(|me| self.cursors.position(room_id, &me));
        self.messages.count_after(room_id, cursor)
    }

    /// The recorded read cursor of the active user in a room.
    pub fn cursor(&self, room_id: &RoomId) -> Option<MessageId> {
        let me = self.service.as_ref().map(ChatService::id)?;
        self.cursors.position(room_id, &me)
    }

    /// Identifier of the currently open room.
    pub fn current_room(&self) -> Option<&RoomId> {
        self.current_room.as_ref()
    }

    /// Whether a room's event stream is attached.
    pub fn is_subscribed(&self, room_id: &RoomId) -> bool {
        self.subscriptions.is_subscribed(room_id)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Attach the event stream for a room unless already attached.
    ///
    /// Associated function rather than a method so callers can hold the
    /// service borrow alongside the subscription table.
    async fn ensure_subscribed(
        service: &S,
        subscriptions: &mut SubscriptionManager,
        room_id: &RoomId,
    ) {
        if !subscriptions.begin_attach(room_id) {
            return;
        }
        match service.subscribe_to_room(room_id).await {
            Ok(()) => subscriptions.confirm(room_id),
            Err(error) => {
                tracing::warn!(room = %room_id, %error, "subscription attach failed");
                subscriptions.abort(room_id);
            },
        }
    }
}

impl<S: ChatService> Default for SessionController<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ChatService> fmt::Debug for SessionController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("room_count", &self.directory.len())
            .field("current_room", &self.current_room)
            .field("subscribed", &self.subscriptions.subscribed_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex, PoisonError};

    use async_trait::async_trait;
    use palaver_core::ServiceError;

    use super::*;

    /// Minimal recording service for controller unit tests. The full
    /// in-memory fake lives in `palaver-harness`.
    #[derive(Clone, Default)]
    struct RecordingService {
        calls: Arc<Mutex<Vec<String>>>,
        rooms: Vec<Room>,
    }

    impl RecordingService {
        fn record(&self, call: String) {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }
    }

    #[async_trait]
    impl ChatService for RecordingService {
        fn id(&self) -> UserId {
            UserId::from("alice")
        }

        fn display_name(&self) -> String {
            "Alice".to_owned()
        }

        fn rooms(&self) -> Vec<Room> {
            self.rooms.clone()
        }

        fn read_cursor(&self, _room_id: &RoomId) -> Option<MessageId> {
            None
        }

        async fn create_room(&self, options: RoomOptions) -> Result<Room, ServiceError> {
            self.record(format!("create_room {}", options.name));
            Ok(room("created", &options.name))
        }

        async fn add_user_to_room(
            &self,
            change: MembershipChange,
        ) -> Result<Room, ServiceError> {
            self.record(format!("add {} {}", change.user_id, change.room_id));
            Ok(room(change.room_id.as_str(), "room"))
        }

        async fn remove_user_from_room(
            &self,
            change: MembershipChange,
        ) -> Result<Room, ServiceError> {
            self.record(format!("remove {} {}", change.user_id, change.room_id));
            Ok(room(change.room_id.as_str(), "room"))
        }

        async fn leave_room(&self, room_id: &RoomId) -> Result<(), ServiceError> {
            self.record(format!("leave {room_id}"));
            Ok(())
        }

        async fn set_read_cursor(
            &self,
            room_id: &RoomId,
            position: MessageId,
        ) -> Result<(), ServiceError> {
            self.record(format!("cursor {room_id} {position}"));
            Ok(())
        }

        async fn send_message(&self, room_id: &RoomId, body: String) -> Result<(), ServiceError> {
            self.record(format!("send {room_id} {body}"));
            Ok(())
        }

        async fn subscribe_to_room(&self, room_id: &RoomId) -> Result<(), ServiceError> {
            self.record(format!("subscribe {room_id}"));
            Ok(())
        }
    }

    fn room(id: &str, name: &str) -> Room {
        Room {
            id: RoomId::from(id),
            name: name.to_owned(),
            private: false,
            member_ids: vec![UserId::from("alice")],
            created_at_ms: 0,
            last_activity_ms: 0,
        }
    }

    #[tokio::test]
    async fn operations_require_an_active_user() {
        let mut session: SessionController<RecordingService> = SessionController::new();

        let err = session.join_room(room("general", "General")).await;
        assert!(matches!(err, Err(SessionError::NoActiveUser)));

        let err = session.create_room(RoomOptions::default()).await;
        assert!(matches!(err, Err(SessionError::NoActiveUser)));

        let err = session.set_cursor(&RoomId::from("general"), "1").await;
        assert!(matches!(err, Err(SessionError::NoActiveUser)));
    }

    #[tokio::test]
    async fn set_user_resubscribes_all_rooms() {
        let service = RecordingService {
            rooms: vec![room("general", "General"), room("random", "Random")],
            ..RecordingService::default()
        };
        let probe = service.clone();
        let mut session = SessionController::new();
        session.set_user(service).await;

        let mut subscribes: Vec<String> = probe
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("subscribe"))
            .collect();
        subscribes.sort();
        assert_eq!(subscribes, vec!["subscribe general", "subscribe random"]);
        assert!(session.is_subscribed(&RoomId::from("general")));
        assert!(session.is_subscribed(&RoomId::from("random")));
    }

    #[tokio::test]
    async fn join_room_with_no_messages_leaves_cursor_untouched() {
        let service = RecordingService::default();
        let probe = service.clone();
        let mut session = SessionController::new();
        session.set_user(service).await;

        session.join_room(room("general", "General")).await.unwrap();

        assert_eq!(session.cursor(&RoomId::from("general")), None);
        assert!(!probe.calls().iter().any(|c| c.starts_with("cursor")));
    }

    #[tokio::test]
    async fn join_room_clears_sidebar_and_sets_current() {
        let service = RecordingService::default();
        let mut session = SessionController::new();
        session.set_user(service).await;
        session.set_sidebar(true);

        session.join_room(room("general", "General")).await.unwrap();

        assert_eq!(session.current_room(), Some(&RoomId::from("general")));
        assert!(!session.snapshot().ui.sidebar_open);
    }

    #[tokio::test]
    async fn send_message_requires_open_room() {
        let service = RecordingService::default();
        let mut session = SessionController::new();
        session.set_user(service).await;

        let err = session.send_message("hello").await;
        assert!(matches!(err, Err(SessionError::NoCurrentRoom)));
    }

    #[tokio::test]
    async fn set_cursor_rejects_non_integer_positions() {
        let service = RecordingService::default();
        let mut session = SessionController::new();
        session.set_user(service).await;

        let err = session.set_cursor(&RoomId::from("general"), "latest").await;
        assert!(matches!(err, Err(SessionError::InvalidPosition(_))));
    }

    #[tokio::test]
    async fn stale_cursor_position_is_not_persisted() {
        let service = RecordingService::default();
        let probe = service.clone();
        let mut session = SessionController::new();
        session.set_user(service).await;

        session.set_cursor(&RoomId::from("general"), "9").await.unwrap();
        session.set_cursor(&RoomId::from("general"), "4").await.unwrap();

        let cursor_calls: Vec<String> =
            probe.calls().into_iter().filter(|c| c.starts_with("cursor")).collect();
        assert_eq!(cursor_calls, vec!["cursor general 9"]);
        assert_eq!(session.cursor(&RoomId::from("general")), Some(MessageId::new(9)));
    }

    #[tokio::test]
    async fn remove_room_clears_current() {
        let service = RecordingService::default();
        let mut session = SessionController::new();
        session.set_user(service).await;
        session.join_room(room("general", "General")).await.unwrap();

        session.remove_room(&RoomId::from("general"));
        assert_eq!(session.current_room(), None);
        assert!(session.snapshot().room.is_none());
    }

    #[tokio::test]
    async fn removing_self_routes_to_leave() {
        let service = RecordingService::default();
        let probe = service.clone();
        let mut session = SessionController::new();
        session.set_user(service).await;
        session.join_room(room("general", "General")).await.unwrap();

        session
            .remove_user_from_room(MembershipChange {
                user_id: UserId::from("alice"),
                room_id: RoomId::from("general"),
            })
            .await
            .unwrap();

        assert!(probe.calls().contains(&"leave general".to_owned()));
        assert!(!probe.calls().iter().any(|c| c.starts_with("remove ")));
        assert_eq!(session.current_room(), None);
    }
}
