//! Joined-room identity.

use std::fmt;

/// Opaque authentication token issued at login.
///
/// `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a token received from the server.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token for the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(<redacted {} bytes>)", self.0.len())
    }
}

/// Server-assigned room identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap an identifier received from the server.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw identifier for the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One joined room: who we are and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: AuthToken,
    room_id: RoomId,
    room_name: String,
}

impl Session {
    /// Create a session from a successful join.
    pub fn new(token: AuthToken, room_id: RoomId, room_name: impl Into<String>) -> Self {
        Self { token, room_id, room_name: room_name.into() }
    }

    /// Authentication token.
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Server-assigned room identifier.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Room display name chosen when joining.
    pub fn room_name(&self) -> &str {
        &self.room_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_debug_redacts_token() {
        let session = Session::new(AuthToken::new("c2VjcmV0"), RoomId::new("r-1"), "lobby-7");
        let printed = format!("{session:?}");

        assert!(!printed.contains("c2VjcmV0"));
        assert!(printed.contains("lobby-7"));
        assert!(printed.contains("r-1"));
    }
}
