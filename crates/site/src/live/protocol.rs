//! Messages exchanged with the browser over the live socket.
//!
//! Both directions are JSON text frames tagged by `type`.

use serde::{Deserialize, Serialize};

use club_core::Route;

use crate::admin::AdminAction;

/// Browser to server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First message of every connection.
    Hello {
        /// `location.hash` at load time, possibly empty.
        #[serde(default)]
        fragment: String,
        /// Credential cached from a previous visit.
        #[serde(default)]
        credential: Option<String>,
    },
    /// The address bar fragment changed.
    FragmentChanged {
        fragment: String,
    },
    /// A navigation button was pressed.
    Navigate {
        route: Route,
    },
    SignIn {
        email: String,
        password: String,
    },
    SignUp {
        email: String,
        password: String,
        confirm_password: String,
    },
    SignOut,
    SubmitContact {
        name: String,
        email: String,
        message: String,
    },
    Admin {
        action: AdminAction,
    },
}

/// Server to browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Write the fragment to the address bar.
    SetFragment {
        fragment: String,
    },
    ScrollTop,
    /// Replace the header and main area.
    Render {
        header: String,
        main: String,
    },
    /// Credential to cache, or `None` to forget it.
    Credential {
        token: Option<String>,
    },
}

impl ClientMessage {
    /// Parse a text frame.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for malformed or unknown messages.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Short name for logs and breadcrumbs. Never includes field values.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::FragmentChanged { .. } => "fragment_changed",
            Self::Navigate { .. } => "navigate",
            Self::SignIn { .. } => "sign_in",
            Self::SignUp { .. } => "sign_up",
            Self::SignOut => "sign_out",
            Self::SubmitContact { .. } => "submit_contact",
            Self::Admin { .. } => "admin",
        }
    }
}

impl ServerMessage {
    /// Encode as a text frame.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if encoding fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::admin::Section;

    #[test]
    fn test_parse_hello_without_credential() {
        let msg = ClientMessage::parse(r##"{"type":"hello","fragment":"#events"}"##).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Hello {
                fragment: "#events".into(),
                credential: None
            }
        );
    }

    #[test]
    fn test_parse_admin_save() {
        let msg = ClientMessage::parse(
            r#"{"type":"admin","action":{"op":"save","section":"partners","values":{"name":"Acme"}}}"#,
        )
        .unwrap();
        let ClientMessage::Admin {
            action: AdminAction::Save { section, values },
        } = msg
        else {
            panic!("expected admin save, got {msg:?}");
        };
        assert_eq!(section, Section::Partners);
        assert_eq!(values.get("name").map(String::as_str), Some("Acme"));
    }

    #[test]
    fn test_parse_navigate_uses_route_tokens() {
        let msg = ClientMessage::parse(r#"{"type":"navigate","route":"login"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Navigate {
                route: Route::Login
            }
        );
        assert!(ClientMessage::parse(r#"{"type":"navigate","route":"nowhere"}"#).is_err());
    }

    #[test]
    fn test_server_messages_are_tagged() {
        let json = ServerMessage::SetFragment {
            fragment: "#home".into(),
        }
        .to_json()
        .unwrap();
        assert_eq!(json, r##"{"type":"set_fragment","fragment":"#home"}"##);

        let json = ServerMessage::Credential { token: None }.to_json().unwrap();
        assert_eq!(json, r#"{"type":"credential","token":null}"#);

        assert_eq!(
            ServerMessage::ScrollTop.to_json().unwrap(),
            r#"{"type":"scroll_top"}"#
        );
    }
}
