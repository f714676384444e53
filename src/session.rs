//! Connection session
//!
//! One `Session` per transport connection. It binds the connection to a
//! participant once `register` succeeds and remembers which room channels
//! the connection has joined.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::{EventError, SendError};
use crate::message::ServerEvent;
use crate::participant::Participant;
use crate::types::ConnectionId;

/// Lifecycle of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no identity yet
    Unauthenticated,
    /// Bound to a participant
    Registered(Participant),
    /// Disconnected (terminal)
    Closed,
}

/// Per-connection state held by the server actor
#[derive(Debug)]
pub struct Session {
    /// Connection this session belongs to
    pub id: ConnectionId,
    /// Server → Client event channel
    sender: mpsc::Sender<ServerEvent>,
    state: SessionState,
    /// Room channels this connection receives fan-out for
    channels: HashSet<String>,
}

impl Session {
    /// Create an unauthenticated session for a new connection
    pub fn new(id: ConnectionId, sender: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id,
            sender,
            state: SessionState::Unauthenticated,
            channels: HashSet::new(),
        }
    }

    /// Queue an event for this connection without waiting
    ///
    /// Returns an error if the queue is full or the connection is gone.
    pub fn send(&self, event: ServerEvent) -> Result<(), SendError> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => SendError::ChannelFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Registered participant, if any
    pub fn participant(&self) -> Option<&Participant> {
        match &self.state {
            SessionState::Registered(p) => Some(p),
            SessionState::Unauthenticated | SessionState::Closed => None,
        }
    }

    /// Bind this connection to `participant`
    ///
    /// Only valid once, from the unauthenticated state.
    pub fn register(&mut self, participant: Participant) -> Result<(), EventError> {
        match self.state {
            SessionState::Unauthenticated => {
                self.state = SessionState::Registered(participant);
                Ok(())
            }
            SessionState::Registered(_) => Err(EventError::AlreadyRegistered),
            SessionState::Closed => Err(EventError::UnknownConnection),
        }
    }

    /// Move to the terminal state, returning the participant that was bound
    pub fn close(&mut self) -> Option<Participant> {
        self.channels.clear();
        match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Registered(p) => Some(p),
            SessionState::Unauthenticated | SessionState::Closed => None,
        }
    }

    pub fn join_channel(&mut self, channel: &str) {
        self.channels.insert(channel.to_string());
    }

    pub fn leave_channel(&mut self, channel: &str) -> bool {
        self.channels.remove(channel)
    }

    pub fn in_channel(&self, channel: &str) -> bool {
        self.channels.contains(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::Role;
    use crate::types::IdCard;

    fn participant(id: ConnectionId) -> Participant {
        Participant::new(id, IdCard::from("S1"), "Ani".into(), Role::Siswa)
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (tx, _rx) = mpsc::channel(8);
        let id = ConnectionId::new();
        let mut session = Session::new(id, tx);

        assert_eq!(session.state(), &SessionState::Unauthenticated);
        assert!(session.participant().is_none());

        session.register(participant(id)).unwrap();
        assert_eq!(session.participant().unwrap().id_card, IdCard::from("S1"));
        assert_eq!(session.register(participant(id)), Err(EventError::AlreadyRegistered));

        assert_eq!(session.close(), Some(participant(id)));
        assert_eq!(session.state(), &SessionState::Closed);
        assert_eq!(session.register(participant(id)), Err(EventError::UnknownConnection));
    }

    #[tokio::test]
    async fn test_close_unauthenticated() {
        let (tx, _rx) = mpsc::channel(8);
        let mut session = Session::new(ConnectionId::new(), tx);
        assert!(session.close().is_none());
    }

    #[tokio::test]
    async fn test_channels() {
        let (tx, _rx) = mpsc::channel(8);
        let mut session = Session::new(ConnectionId::new(), tx);

        session.join_channel("room-1");
        assert!(session.in_channel("room-1"));
        assert!(session.leave_channel("room-1"));
        assert!(!session.leave_channel("room-1"));
        assert!(!session.in_channel("room-1"));
    }

    #[tokio::test]
    async fn test_send_errors() {
        let (tx, mut rx) = mpsc::channel(1);
        let id = ConnectionId::new();
        let session = Session::new(id, tx);

        session.send(ServerEvent::Connected { socket_id: id }).unwrap();
        assert_eq!(
            session.send(ServerEvent::Connected { socket_id: id }),
            Err(SendError::ChannelFull)
        );

        assert!(rx.recv().await.is_some());
        drop(rx);
        assert_eq!(
            session.send(ServerEvent::Connected { socket_id: id }),
            Err(SendError::ChannelClosed)
        );
    }
}
