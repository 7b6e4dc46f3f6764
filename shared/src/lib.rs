use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_NUMBER: u32 = 1;
pub const MAX_NUMBER: u32 = 75;
pub const DIRECT_PICK_THRESHOLD: usize = 20;
pub const MAX_DRAW_ATTEMPTS: u32 = 10;
pub const MAX_NAME_LEN: usize = 20;
pub const DEFAULT_ANIMATION_DELAY_MS: u64 = 500;
pub const DEFAULT_SESSION_ID: &str = "default";
pub const DEFAULT_THEME: &str = "party";

/// Arithmetic operator appearing in a draw expression. Serialized as the
/// display symbol so clients can render the expression verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "×")]
    Multiply,
    #[serde(rename = "÷")]
    Divide,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "×",
            Operator::Divide => "÷",
        }
    }
}

/// One draw: the puzzle expression `x operator z` and its result.
///
/// Direct picks (endgame and fallback draws) are encoded as trivial
/// additions with a zero operand, so clients need no special case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calculation {
    pub x: u32,
    pub operator: Operator,
    pub z: u32,
    pub result: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub status: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl Player {
    pub fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            status: None,
            joined_at: Utc::now(),
        }
    }
}

/// One game instance: draw history, player roster and presentation theme.
///
/// `picked_numbers` is ordered by draw; `players` by join. The whole record
/// doubles as the snapshot sent to a connection when it joins the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub picked_numbers: Vec<u32>,
    pub players: Vec<Player>,
    pub start_time: DateTime<Utc>,
    pub theme: String,
}

impl Session {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            picked_numbers: Vec::new(),
            players: Vec::new(),
            start_time: Utc::now(),
            theme: DEFAULT_THEME.to_string(),
        }
    }

    /// All 75 numbers drawn; no further draws until a reset.
    pub fn is_complete(&self) -> bool {
        self.picked_numbers.len() >= MAX_NUMBER as usize
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: u32) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Removes a player from the roster, returning the removed record.
    pub fn remove_player(&mut self, id: u32) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(index))
    }

    /// Starts a new round: clears the draw history and every player's
    /// status. The roster and theme survive the reset.
    pub fn reset_draws(&mut self) {
        self.picked_numbers.clear();
        for player in &mut self.players {
            player.status = None;
        }
    }
}

/// Events sent by clients. Wire format: `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinSession {
        session_id: String,
        #[serde(default)]
        is_host: bool,
    },
    #[serde(rename_all = "camelCase")]
    PlayerJoin { session_id: String, name: String },
    PickNumber,
    StatusChange { status: Option<String> },
    ThemeChange { theme: String },
    ResetGame,
}

/// Events sent by the server, privately or to a whole session room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    SessionState(Session),
    JoinError {
        message: String,
    },
    PlayerJoined(Player),
    #[serde(rename_all = "camelCase")]
    PlayerRegistered {
        player_id: u32,
    },
    #[serde(rename_all = "camelCase")]
    NumberPicked {
        calculation: Calculation,
        picked_numbers: Vec<u32>,
        remaining: u32,
        animation_delay: u64,
    },
    GameComplete,
    #[serde(rename_all = "camelCase")]
    PlayerStatusChanged {
        player_id: u32,
        name: String,
        status: Option<String>,
    },
    ThemeChanged {
        theme: String,
    },
    GameReset,
    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        player_id: u32,
        name: String,
    },
}

/// Validates and normalizes a display name: trim, cap at [`MAX_NAME_LEN`]
/// characters, reject empty results and anything containing a `<...>`
/// markup-like substring. Returns the cleaned name or a message suitable
/// for a `join_error` payload.
pub fn sanitize_name(raw: &str) -> Result<String, &'static str> {
    let name: String = raw.trim().chars().take(MAX_NAME_LEN).collect();

    if name.is_empty() {
        return Err("Please enter a name");
    }
    if contains_markup(&name) {
        return Err("Special characters are not allowed");
    }

    Ok(name)
}

// Matches anything of the form `<...>`, the same shapes a browser would
// treat as a tag.
fn contains_markup(s: &str) -> bool {
    let mut open = false;
    for c in s.chars() {
        match c {
            '<' => open = true,
            '>' if open => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let player = Player::new(7, "Alice".to_string());
        assert_eq!(player.id, 7);
        assert_eq!(player.name, "Alice");
        assert_eq!(player.status, None);
    }

    #[test]
    fn test_session_creation() {
        let session = Session::new("party-1");
        assert_eq!(session.session_id, "party-1");
        assert!(session.picked_numbers.is_empty());
        assert!(session.players.is_empty());
        assert_eq!(session.theme, DEFAULT_THEME);
        assert!(!session.is_complete());
    }

    #[test]
    fn test_session_completion() {
        let mut session = Session::new("s");
        session.picked_numbers = (1..=MAX_NUMBER).collect();
        assert!(session.is_complete());
    }

    #[test]
    fn test_session_reset_preserves_roster_and_theme() {
        let mut session = Session::new("s");
        session.theme = "space".to_string();
        session.picked_numbers = vec![3, 14, 15];
        session.players.push(Player::new(1, "Ann".to_string()));
        session.players.push(Player::new(2, "Ben".to_string()));
        session.players[0].status = Some("bingo".to_string());

        session.reset_draws();

        assert!(session.picked_numbers.is_empty());
        assert_eq!(session.players.len(), 2);
        assert!(session.players.iter().all(|p| p.status.is_none()));
        assert_eq!(session.theme, "space");
    }

    #[test]
    fn test_remove_player() {
        let mut session = Session::new("s");
        session.players.push(Player::new(1, "Ann".to_string()));
        session.players.push(Player::new(2, "Ben".to_string()));

        let removed = session.remove_player(1).unwrap();
        assert_eq!(removed.name, "Ann");
        assert_eq!(session.players.len(), 1);
        assert_eq!(session.players[0].id, 2);

        assert!(session.remove_player(99).is_none());
    }

    #[test]
    fn test_sanitize_name_trims() {
        assert_eq!(sanitize_name("  Bob  ").unwrap(), "Bob");
    }

    #[test]
    fn test_sanitize_name_rejects_empty() {
        assert!(sanitize_name("").is_err());
        assert!(sanitize_name("   ").is_err());
    }

    #[test]
    fn test_sanitize_name_rejects_markup() {
        assert!(sanitize_name("<script>").is_err());
        assert!(sanitize_name("a<b>c").is_err());
        // A lone angle bracket is not a tag.
        assert!(sanitize_name("a < b").is_ok());
    }

    #[test]
    fn test_sanitize_name_truncates() {
        let long = "x".repeat(30);
        let name = sanitize_name(&long).unwrap();
        assert_eq!(name.chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_client_event_wire_format() {
        let json = r#"{"event":"join_session","data":{"sessionId":"abc","isHost":true}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinSession {
                session_id: "abc".to_string(),
                is_host: true,
            }
        );

        // is_host defaults to false for player pages.
        let json = r#"{"event":"join_session","data":{"sessionId":"abc"}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinSession {
                session_id: "abc".to_string(),
                is_host: false,
            }
        );
    }

    #[test]
    fn test_dataless_client_event() {
        let event: ClientEvent = serde_json::from_str(r#"{"event":"pick_number"}"#).unwrap();
        assert_eq!(event, ClientEvent::PickNumber);

        let event: ClientEvent = serde_json::from_str(r#"{"event":"reset_game"}"#).unwrap();
        assert_eq!(event, ClientEvent::ResetGame);
    }

    #[test]
    fn test_server_event_wire_format() {
        let event = ServerEvent::NumberPicked {
            calculation: Calculation {
                x: 3,
                operator: Operator::Multiply,
                z: 7,
                result: 21,
            },
            picked_numbers: vec![21],
            remaining: 74,
            animation_delay: 500,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"number_picked""#));
        assert!(json.contains(r#""pickedNumbers":[21]"#));
        assert!(json.contains(r#""animationDelay":500"#));
        assert!(json.contains(r#""operator":"×""#));

        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(Operator::Add.symbol(), "+");
        assert_eq!(Operator::Subtract.symbol(), "-");
        assert_eq!(Operator::Multiply.symbol(), "×");
        assert_eq!(Operator::Divide.symbol(), "÷");
    }

    #[test]
    fn test_session_snapshot_serialization() {
        let mut session = Session::new("s1");
        session.players.push(Player::new(1, "Ann".to_string()));

        let json = serde_json::to_string(&ServerEvent::SessionState(session)).unwrap();
        assert!(json.contains(r#""event":"session_state""#));
        assert!(json.contains(r#""sessionId":"s1""#));
        assert!(json.contains(r#""startTime""#));
        assert!(json.contains(r#""status":null"#));
    }
}
