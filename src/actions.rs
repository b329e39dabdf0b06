//! Structured inline-button payloads.
//!
//! Every button carries a `MenuAction`. It is encoded into Telegram callback
//! data when the keyboard is built and decoded once when the tap arrives.

use std::fmt;
use std::str::FromStr;

use crate::errors::ActionParseError;
use crate::selection::{Block, Inspection, Level, Orientation};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    SetInspection(Inspection),
    SetBlock(Block),
    SetOrientation(Orientation),
    SetLevel(Level),
    /// Proceed to the upload step with the current selection
    Confirm,
    /// Return to level selection
    Back,
    /// Drop the session entirely
    Cancel,
    /// Pick a new location from scratch
    StartOver,
    /// Keep uploading to the current location
    AddMore,
}

impl MenuAction {
    /// Callback data for this action
    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn decode(data: &str) -> Result<Self, ActionParseError> {
        data.parse()
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuAction::SetInspection(value) => write!(f, "ins:{value}"),
            MenuAction::SetBlock(value) => write!(f, "blk:{value}"),
            MenuAction::SetOrientation(value) => write!(f, "ori:{value}"),
            MenuAction::SetLevel(value) => write!(f, "lvl:{value}"),
            MenuAction::Confirm => f.write_str("confirm"),
            MenuAction::Back => f.write_str("back"),
            MenuAction::Cancel => f.write_str("cancel"),
            MenuAction::StartOver => f.write_str("start_over"),
            MenuAction::AddMore => f.write_str("add_more"),
        }
    }
}

impl FromStr for MenuAction {
    type Err = ActionParseError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let invalid = |_: String| ActionParseError(data.to_string());

        let action = match data.split_once(':') {
            Some(("ins", value)) => MenuAction::SetInspection(value.parse().map_err(invalid)?),
            Some(("blk", value)) => MenuAction::SetBlock(value.parse().map_err(invalid)?),
            Some(("ori", value)) => MenuAction::SetOrientation(value.parse().map_err(invalid)?),
            Some(("lvl", value)) => MenuAction::SetLevel(value.parse().map_err(invalid)?),
            Some(_) => return Err(ActionParseError(data.to_string())),
            None => match data {
                "confirm" => MenuAction::Confirm,
                "back" => MenuAction::Back,
                "cancel" => MenuAction::Cancel,
                "start_over" => MenuAction::StartOver,
                "add_more" => MenuAction::AddMore,
                _ => return Err(ActionParseError(data.to_string())),
            },
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_courtyard_orientation_payload() {
        let action = MenuAction::SetOrientation(Orientation::CourtyardSouth);
        assert_eq!(action.encode(), "ori:Courtyard_South");
        assert_eq!(MenuAction::decode("ori:Courtyard_South"), Ok(action));
    }

    #[test]
    fn test_payloads_fit_telegram_limit() {
        let longest = MenuAction::SetOrientation(Orientation::CourtyardNorth).encode();
        assert!(longest.len() <= 64);
    }

    #[test]
    fn test_invalid_payloads_rejected() {
        for data in ["", "ins:XX", "lvl:L12", "blk:", "foo:A", "inspection_BW", "confirm_BW_A"] {
            assert!(MenuAction::decode(data).is_err(), "{data} should be rejected");
        }
    }
}
