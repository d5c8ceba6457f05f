use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Events emitted by a running reply stream, applied to the conversation
/// in the order they were sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The backend answered with a success status; body chunks follow
    Connected,
    /// Decoded text to append to the open assistant turn
    Fragment(String),
    /// The body ended normally
    Completed,
    /// The request or body read failed
    Failed(String),
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "Assistant",
        }
    }
}

/// Light/dark display mode of the terminal UI
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Light,
    Dark,
}

impl DisplayMode {
    pub fn toggled(self) -> DisplayMode {
        match self {
            DisplayMode::Light => DisplayMode::Dark,
            DisplayMode::Dark => DisplayMode::Light,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&ChatRole::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&ChatRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn display_mode_toggles_and_parses() {
        assert_eq!(DisplayMode::Light.toggled(), DisplayMode::Dark);
        assert_eq!(DisplayMode::Dark.toggled().toggled(), DisplayMode::Dark);
        assert_eq!(DisplayMode::from_str("dark").unwrap(), DisplayMode::Dark);
        assert_eq!(DisplayMode::Light.as_ref(), "light");
    }
}
