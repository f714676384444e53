//! Server actor implementation
//!
//! The central actor that owns all shared state: the `ChatServer` registry,
//! the presence index, and one `Session` per connection. Handlers only talk
//! to it through `ServerCommand`s, so every event runs to completion against
//! a consistent view before the next one is processed.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::chat::MessageDraft;
use crate::chat_server::ChatServer;
use crate::error::EventError;
use crate::message::{ClientEvent, Opponent, Registration, ServerEvent};
use crate::participant::{Participant, Role};
use crate::presence::PresenceIndex;
use crate::room::{Room, RoomSummary};
use crate::session::Session;
use crate::types::{ConnectionId, IdCard};

/// Commands sent from connection handlers to the server actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection opened
    Connect {
        connection_id: ConnectionId,
        sender: mpsc::Sender<ServerEvent>,
    },
    /// Event received on a connection
    Event {
        connection_id: ConnectionId,
        event: ClientEvent,
    },
    /// Connection closed
    Disconnect {
        connection_id: ConnectionId,
        reason: String,
    },
}

/// The server actor
pub struct Server {
    chat: ChatServer,
    presence: PresenceIndex,
    sessions: HashMap<ConnectionId, Session>,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl Server {
    /// Create a server over `chat`, fed by `receiver`
    pub fn new(chat: ChatServer, receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            chat,
            presence: PresenceIndex::new(),
            sessions: HashMap::new(),
            receiver,
        }
    }

    /// Run the event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("Server started with {} topic rooms", self.chat.rooms().len());

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("Server shutting down");
    }

    pub fn chat(&self) -> &ChatServer {
        &self.chat
    }

    pub fn presence(&self) -> &PresenceIndex {
        &self.presence
    }

    pub fn session(&self, connection_id: ConnectionId) -> Option<&Session> {
        self.sessions.get(&connection_id)
    }

    /// Process a single command
    pub fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect {
                connection_id,
                sender,
            } => self.handle_connect(connection_id, sender),
            ServerCommand::Event {
                connection_id,
                event,
            } => self.handle_event(connection_id, event),
            ServerCommand::Disconnect {
                connection_id,
                reason,
            } => self.handle_disconnect(connection_id, &reason),
        }
    }

    fn handle_connect(&mut self, connection_id: ConnectionId, sender: mpsc::Sender<ServerEvent>) {
        info!("New connection - {}", connection_id);
        self.sessions
            .insert(connection_id, Session::new(connection_id, sender));
        self.emit(
            connection_id,
            ServerEvent::Connected {
                socket_id: connection_id,
            },
        );
        debug!("Total connections: {}", self.sessions.len());
    }

    /// Dispatch one inbound event; misses are logged and otherwise ignored
    fn handle_event(&mut self, connection_id: ConnectionId, event: ClientEvent) {
        let name = event.name();
        let result = match event {
            ClientEvent::Register(registration) => self.handle_register(connection_id, registration),
            ClientEvent::GetStats => self.handle_get_stats(connection_id),
            ClientEvent::Join(room_id) => self.handle_join(connection_id, room_id),
            ClientEvent::Leave(room_id) => self.handle_leave(connection_id, &room_id),
            ClientEvent::SendMessage { message, room_id } => {
                self.handle_send_message(connection_id, message, &room_id)
            }
            ClientEvent::LoadPrivateMessages(opponent) => {
                self.handle_load_private_messages(connection_id, &opponent)
            }
            ClientEvent::ResetCount(opponent) => self.handle_reset_count(connection_id, &opponent),
            ClientEvent::GetSocketId { id_card, role } => {
                self.handle_get_socket_id(connection_id, &id_card, role)
            }
            ClientEvent::SendPrivateMessage { message, opponent } => {
                self.handle_send_private_message(connection_id, message, opponent)
            }
            ClientEvent::PrivateTyping(opponent) => self.handle_private_typing(connection_id, &opponent),
            ClientEvent::Typing(room_id) => self.handle_typing(connection_id, room_id),
        };

        if let Err(e) = result {
            debug!("Ignored '{}' from {}: {}", name, connection_id, e);
        }
    }

    fn handle_register(
        &mut self,
        connection_id: ConnectionId,
        registration: Registration,
    ) -> Result<(), EventError> {
        let session = self
            .sessions
            .get_mut(&connection_id)
            .ok_or(EventError::UnknownConnection)?;

        let participant = Participant::new(
            connection_id,
            registration.id_card,
            registration.username,
            registration.role,
        );
        session.register(participant.clone())?;

        info!(
            "[{}] {} - {} registered",
            participant.id_card, participant.name, participant.role
        );

        self.chat
            .add_private_chat_by_user_id(participant.id_card.clone());
        self.chat.add_participant(participant.clone());
        if let Some(previous) = self.presence.insert(participant.id_card.clone(), connection_id) {
            debug!(
                "{} moved from connection {} to {}",
                participant.id_card, previous, connection_id
            );
        }

        self.broadcast_except(connection_id, ServerEvent::online(participant));
        Ok(())
    }

    fn handle_get_stats(&mut self, connection_id: ConnectionId) -> Result<(), EventError> {
        let participant = self.participant(connection_id)?;
        debug!("{} request stats", participant.name);

        let rooms = self.chat.room_list_for(&participant.id_card);
        let online_users = self.chat.visible_roster(participant.role).to_vec();
        self.emit(connection_id, ServerEvent::StatsLoaded { rooms, online_users });
        Ok(())
    }

    fn handle_join(&mut self, connection_id: ConnectionId, room_id: String) -> Result<(), EventError> {
        let participant = self.participant(connection_id)?;
        let room = self
            .chat
            .get_room_mut(&room_id)
            .ok_or_else(|| EventError::RoomNotFound(room_id.clone()))?;

        if !room.has_member(connection_id) {
            room.join(participant.clone());
        }
        let users = room.members().to_vec();
        let messages = room.messages().to_vec();
        info!("{} join to room '{}'", participant.name, room.name);

        if let Some(session) = self.sessions.get_mut(&connection_id) {
            session.join_channel(&room_id);
        }
        self.emit(
            connection_id,
            ServerEvent::Joined {
                room_id,
                users,
                messages,
            },
        );
        Ok(())
    }

    fn handle_leave(&mut self, connection_id: ConnectionId, room_id: &str) -> Result<(), EventError> {
        let participant = self.participant(connection_id)?;
        let room = self
            .chat
            .get_room_mut(room_id)
            .ok_or_else(|| EventError::RoomNotFound(room_id.to_string()))?;

        room.leave(connection_id);
        info!("{} leave room '{}'", participant.name, room.name);

        if let Some(session) = self.sessions.get_mut(&connection_id) {
            session.leave_channel(room_id);
        }
        Ok(())
    }

    fn handle_send_message(
        &mut self,
        connection_id: ConnectionId,
        draft: MessageDraft,
        room_id: &str,
    ) -> Result<(), EventError> {
        let participant = self.participant(connection_id)?;
        let room = self
            .chat
            .get_room_mut(room_id)
            .ok_or_else(|| EventError::RoomNotFound(room_id.to_string()))?;

        let message = draft.into_message(participant);
        room.send(message.clone());

        self.emit_to_channel_except(room_id, connection_id, ServerEvent::Message(message));
        self.broadcast_room_lists_except(connection_id);
        Ok(())
    }

    fn handle_send_private_message(
        &mut self,
        connection_id: ConnectionId,
        draft: MessageDraft,
        opponent: Opponent,
    ) -> Result<(), EventError> {
        let participant = self.participant(connection_id)?;
        if opponent.id_card == participant.id_card {
            return Err(EventError::SelfMessage);
        }

        let message = draft.into_message(participant.clone());

        let own = self.chat.private_room_or_create(
            &participant.id_card,
            &opponent.id_card,
            opponent.name.as_deref(),
        );
        own.send(message.clone());

        let theirs = self
            .chat
            .private_room_or_create(&opponent.id_card, &participant.id_card, None);
        theirs.send(message.clone());
        theirs.increment_unread();

        match self.presence.get(&opponent.id_card) {
            Some(target) => {
                self.emit(
                    target,
                    ServerEvent::GotPrivateMessage {
                        message,
                        user: participant.clone(),
                    },
                );
                self.emit(
                    target,
                    ServerEvent::RoomUpdated {
                        rooms: self.chat.room_list_for(&opponent.id_card),
                    },
                );
            }
            None => debug!(
                "{} is offline, private message from {} stored only",
                opponent.id_card, participant.id_card
            ),
        }

        self.emit(
            connection_id,
            ServerEvent::RoomUpdated {
                rooms: self.chat.room_list_for(&participant.id_card),
            },
        );
        Ok(())
    }

    fn handle_load_private_messages(
        &mut self,
        connection_id: ConnectionId,
        opponent: &IdCard,
    ) -> Result<(), EventError> {
        let participant = self.participant(connection_id)?;
        let room = self
            .chat
            .private_room_or_create(&participant.id_card, opponent, None);

        let messages = room.messages().to_vec();
        let had_unread = room.unread_count() > 0;
        if had_unread {
            room.reset_unread();
        }

        self.emit(connection_id, ServerEvent::PrivateMessagesLoaded { messages });
        if had_unread {
            self.emit_own_room_list(connection_id, &participant.id_card);
        }
        Ok(())
    }

    fn handle_reset_count(
        &mut self,
        connection_id: ConnectionId,
        opponent: &IdCard,
    ) -> Result<(), EventError> {
        let participant = self.participant(connection_id)?;
        let room = self
            .chat
            .get_private_room_mut(&participant.id_card, opponent)
            .ok_or_else(|| EventError::PrivateRoomNotFound(opponent.clone()))?;

        if room.unread_count() > 0 {
            room.reset_unread();
            self.emit_own_room_list(connection_id, &participant.id_card);
        }
        Ok(())
    }

    fn handle_get_socket_id(
        &mut self,
        connection_id: ConnectionId,
        id_card: &IdCard,
        role: Role,
    ) -> Result<(), EventError> {
        let participant = self.participant(connection_id)?;
        debug!("{} request socket id for {}", participant.name, id_card);

        self.chat
            .get_online(id_card, role)
            .ok_or_else(|| EventError::ParticipantOffline(id_card.clone()))?;
        let socket_id = self
            .presence
            .get(id_card)
            .ok_or_else(|| EventError::ParticipantOffline(id_card.clone()))?;

        self.emit(connection_id, ServerEvent::GotSocketId(socket_id));
        Ok(())
    }

    fn handle_private_typing(
        &mut self,
        connection_id: ConnectionId,
        opponent: &IdCard,
    ) -> Result<(), EventError> {
        let participant = self.participant(connection_id)?;
        let target = self
            .presence
            .get(opponent)
            .ok_or_else(|| EventError::ParticipantOffline(opponent.clone()))?;

        self.emit(
            target,
            ServerEvent::Typing {
                room_id: participant.id_card.to_string(),
                who: participant,
            },
        );
        Ok(())
    }

    fn handle_typing(&mut self, connection_id: ConnectionId, room_id: String) -> Result<(), EventError> {
        let participant = self.participant(connection_id)?;
        if !self.chat.room_exists(&room_id) {
            return Err(EventError::RoomNotFound(room_id));
        }

        self.emit_to_channel_except(
            &room_id,
            connection_id,
            ServerEvent::Typing {
                room_id: room_id.clone(),
                who: participant.clone(),
            },
        );
        self.broadcast_except(
            connection_id,
            ServerEvent::BcTyping {
                room_id,
                who: participant,
            },
        );
        Ok(())
    }

    /// Handle connection close
    fn handle_disconnect(&mut self, connection_id: ConnectionId, reason: &str) {
        let Some(mut session) = self.sessions.remove(&connection_id) else {
            return;
        };

        self.chat.leave_all_rooms(connection_id);

        match session.close() {
            Some(participant) => {
                warn!(
                    "{} disconnect with reason {}",
                    participant.name, reason
                );
                self.presence.remove(&participant.id_card, connection_id);
                self.chat.remove_participant(&participant);
                self.broadcast_except(connection_id, ServerEvent::offline(participant));
            }
            None => info!("Connection {} closed before register: {}", connection_id, reason),
        }

        debug!(
            "Total connections: {}, online: {}",
            self.sessions.len(),
            self.presence.len()
        );
    }

    /// Helper: participant registered on `connection_id`
    fn participant(&self, connection_id: ConnectionId) -> Result<Participant, EventError> {
        self.sessions
            .get(&connection_id)
            .ok_or(EventError::UnknownConnection)?
            .participant()
            .cloned()
            .ok_or(EventError::Unauthenticated)
    }

    /// Helper: room list a session gets to see
    fn room_list_for_session(&self, session: &Session) -> Vec<RoomSummary> {
        match session.participant() {
            Some(p) => self.chat.room_list_for(&p.id_card),
            None => self.chat.rooms().iter().map(Room::summary).collect(),
        }
    }

    fn emit_own_room_list(&self, connection_id: ConnectionId, id_card: &IdCard) {
        self.emit(
            connection_id,
            ServerEvent::RoomUpdated {
                rooms: self.chat.room_list_for(id_card),
            },
        );
    }

    /// Send each connection except `except` its own fresh room list
    fn broadcast_room_lists_except(&self, except: ConnectionId) {
        for session in self.sessions.values().filter(|s| s.id != except) {
            let rooms = self.room_list_for_session(session);
            deliver(session, ServerEvent::RoomUpdated { rooms });
        }
    }

    /// Emit to one connection
    fn emit(&self, connection_id: ConnectionId, event: ServerEvent) {
        match self.sessions.get(&connection_id) {
            Some(session) => deliver(session, event),
            None => debug!("No session for {}, event dropped", connection_id),
        }
    }

    /// Emit to every connection except `except`
    fn broadcast_except(&self, except: ConnectionId, event: ServerEvent) {
        for session in self.sessions.values().filter(|s| s.id != except) {
            deliver(session, event.clone());
        }
    }

    /// Emit to every connection in `channel` except `except`
    fn emit_to_channel_except(&self, channel: &str, except: ConnectionId, event: ServerEvent) {
        for session in self
            .sessions
            .values()
            .filter(|s| s.id != except && s.in_channel(channel))
        {
            deliver(session, event.clone());
        }
    }
}

/// Best-effort delivery; a full or closed queue drops the event
fn deliver(session: &Session, event: ServerEvent) {
    if let Err(e) = session.send(event) {
        warn!("Dropped event for {}: {}", session.id, e);
    }
}
