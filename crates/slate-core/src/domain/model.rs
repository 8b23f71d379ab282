//! Entities mirrored from the host: profiles, buttons, action results, and
//! system statistics.
//!
//! Field names follow the host's JSON (`camelCase`) via serde renames, so a
//! `Button` deserialises directly from a `BUTTONS_LIST` payload entry:
//!
//! ```json
//! {"id":"b1","label":"Play","icon":"play","actionType":"MEDIA_PLAY_PAUSE",
//!  "actionPayload":null,"background":"#222","iconColor":"#fff"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named set of buttons.  Exactly one profile is active per controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
}

/// What the host does when a button is pressed.
///
/// Unknown action types decode as [`ActionType::Other`] so that a newer host
/// can introduce actions without breaking older controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    MediaPlayPause,
    MediaNext,
    MediaPrev,
    AppLaunch,
    Hotkey,
    OpenUrl,
    OpenFolder,
    VolumeUp,
    VolumeDown,
    VolumeMute,
    SystemCpu,
    SystemRam,
    SystemGpu,
    #[serde(other)]
    Other,
}

impl ActionType {
    /// Returns `true` for tiles that only display a live system reading and
    /// never trigger an action when pressed.
    pub fn is_display_only(self) -> bool {
        matches!(
            self,
            ActionType::SystemCpu | ActionType::SystemRam | ActionType::SystemGpu
        )
    }
}

/// One tile in the controller grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub icon: String,
    pub action_type: ActionType,
    /// Action-specific parameters (hotkey combo, URL, app path, ...).
    /// Opaque to the controller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
}

/// Outcome reported by the host after executing a button's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Success,
    Error,
}

/// The host's report for one button press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub button_id: String,
    pub status: ActionStatus,
    #[serde(default)]
    pub message: String,
}

/// Host resource usage in percent.  `gpu` is `None` when the host has no
/// supported GPU.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub cpu: f64,
    pub ram: f64,
    #[serde(default)]
    pub gpu: Option<f64>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_deserializes_from_host_json() {
        // Arrange
        let json = r##"{"id":"b1","label":"Play","icon":"play","actionType":"MEDIA_PLAY_PAUSE",
                        "actionPayload":null,"background":"#222","iconColor":"#fff"}"##;

        // Act
        let button: Button = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(button.id, "b1");
        assert_eq!(button.action_type, ActionType::MediaPlayPause);
        assert_eq!(button.action_payload, None);
        assert_eq!(button.background.as_deref(), Some("#222"));
        assert_eq!(button.icon_color.as_deref(), Some("#fff"));
    }

    #[test]
    fn test_button_without_optional_styling_fields() {
        let json = r#"{"id":"b2","label":"Vol+","actionType":"VOLUME_UP"}"#;
        let button: Button = serde_json::from_str(json).unwrap();
        assert_eq!(button.icon, "");
        assert!(button.background.is_none());
        assert!(button.icon_color.is_none());
    }

    #[test]
    fn test_unknown_action_type_decodes_as_other() {
        // A newer host may ship action types this controller does not know.
        let json = r#"{"id":"b3","label":"?","actionType":"TELEPORT"}"#;
        let button: Button = serde_json::from_str(json).unwrap();
        assert_eq!(button.action_type, ActionType::Other);
    }

    #[test]
    fn test_system_action_types_are_display_only() {
        assert!(ActionType::SystemCpu.is_display_only());
        assert!(ActionType::SystemGpu.is_display_only());
        assert!(!ActionType::Hotkey.is_display_only());
    }

    #[test]
    fn test_action_result_status_is_lowercase_on_the_wire() {
        let json = r#"{"buttonId":"b1","status":"error","message":"boom"}"#;
        let result: ActionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.status, ActionStatus::Error);
        assert_eq!(result.message, "boom");
    }

    #[test]
    fn test_system_stats_accepts_null_gpu() {
        let stats: SystemStats = serde_json::from_str(r#"{"cpu":12.5,"ram":40.0,"gpu":null}"#).unwrap();
        assert_eq!(stats.gpu, None);
        assert_eq!(stats.cpu, 12.5);
    }
}
