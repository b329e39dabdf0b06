//! # Selection Module
//!
//! The four location parameters a user picks before uploading photos, in the
//! order they must be chosen: inspection, block, orientation, level.
//! Choosing a parameter clears every parameter that comes after it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::SelectionError;

/// Name of the leaf directory every upload lands in
pub const UNSORTED_DIR: &str = "unsorted";

/// Highest numbered floor offered in the level menu
pub const TOP_FLOOR: u8 = 11;

/// Inspection type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Inspection {
    BW,
    SR,
}

impl Inspection {
    pub const ALL: [Inspection; 2] = [Inspection::BW, Inspection::SR];

    pub fn as_str(&self) -> &'static str {
        match self {
            Inspection::BW => "BW",
            Inspection::SR => "SR",
        }
    }
}

/// Building block
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Block {
    A,
    B,
}

impl Block {
    pub const ALL: [Block; 2] = [Block::A, Block::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Block::A => "A",
            Block::B => "B",
        }
    }

    /// Whether the courtyard facades exist for this block
    pub fn has_courtyard(&self) -> bool {
        matches!(self, Block::A)
    }
}

/// Facade orientation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    East,
    North,
    South,
    West,
    #[serde(rename = "Courtyard_East")]
    CourtyardEast,
    #[serde(rename = "Courtyard_North")]
    CourtyardNorth,
    #[serde(rename = "Courtyard_South")]
    CourtyardSouth,
    #[serde(rename = "Courtyard_West")]
    CourtyardWest,
}

impl Orientation {
    pub const CARDINAL: [Orientation; 4] = [
        Orientation::East,
        Orientation::North,
        Orientation::South,
        Orientation::West,
    ];

    pub const COURTYARD: [Orientation; 4] = [
        Orientation::CourtyardEast,
        Orientation::CourtyardNorth,
        Orientation::CourtyardSouth,
        Orientation::CourtyardWest,
    ];

    /// Directory and callback name, e.g. `Courtyard_East`
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::East => "East",
            Orientation::North => "North",
            Orientation::South => "South",
            Orientation::West => "West",
            Orientation::CourtyardEast => "Courtyard_East",
            Orientation::CourtyardNorth => "Courtyard_North",
            Orientation::CourtyardSouth => "Courtyard_South",
            Orientation::CourtyardWest => "Courtyard_West",
        }
    }

    /// Human readable name, e.g. `Courtyard East`
    pub fn display_name(&self) -> String {
        self.as_str().replace('_', " ")
    }

    pub fn is_courtyard(&self) -> bool {
        Self::COURTYARD.contains(self)
    }

    /// Whether this orientation can be chosen for the given block
    pub fn is_available_for(&self, block: Block) -> bool {
        !self.is_courtyard() || block.has_courtyard()
    }
}

/// Floor level: ground floor or L1..L11.
///
/// Stored as its menu label (`GF`, `L5`) so out-of-range floors are
/// rejected when a session is loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    Ground,
    Floor(u8),
}

impl Level {
    /// Every level in menu order: GF, L1, ..., L11
    pub fn all() -> Vec<Level> {
        std::iter::once(Level::Ground)
            .chain((1..=TOP_FLOOR).map(Level::Floor))
            .collect()
    }
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Ground => f.write_str("GF"),
            Level::Floor(n) => write!(f, "L{n}"),
        }
    }
}

impl FromStr for Inspection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Inspection::ALL
            .into_iter()
            .find(|value| value.as_str() == s)
            .ok_or_else(|| format!("unknown inspection '{s}'"))
    }
}

impl FromStr for Block {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Block::ALL
            .into_iter()
            .find(|value| value.as_str() == s)
            .ok_or_else(|| format!("unknown block '{s}'"))
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Orientation::CARDINAL
            .into_iter()
            .chain(Orientation::COURTYARD)
            .find(|value| value.as_str() == s)
            .ok_or_else(|| format!("unknown orientation '{s}'"))
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "GF" {
            return Ok(Level::Ground);
        }
        match s.strip_prefix('L').and_then(|n| n.parse::<u8>().ok()) {
            Some(n) if (1..=TOP_FLOOR).contains(&n) => Ok(Level::Floor(n)),
            _ => Err(format!("unknown level '{s}'")),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.to_string()
    }
}

/// A single menu choice for one of the four fields
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    Inspection(Inspection),
    Block(Block),
    Orientation(Orientation),
    Level(Level),
}

/// The user's in-progress set of menu choices
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub inspection: Option<Inspection>,
    pub block: Option<Block>,
    pub orientation: Option<Orientation>,
    pub level: Option<Level>,
}

impl Selection {
    /// Apply a choice, clearing every field that depends on it.
    ///
    /// The choice is rejected without touching the selection when a field it
    /// depends on has not been chosen yet.
    pub fn apply(&mut self, choice: Choice) -> Result<(), SelectionError> {
        match choice {
            Choice::Inspection(inspection) => {
                self.inspection = Some(inspection);
                self.block = None;
                self.orientation = None;
                self.level = None;
            }
            Choice::Block(block) => {
                if self.inspection.is_none() {
                    return Err(SelectionError::InspectionRequired);
                }
                self.block = Some(block);
                self.orientation = None;
                self.level = None;
            }
            Choice::Orientation(orientation) => {
                let block = match (self.inspection, self.block) {
                    (Some(_), Some(block)) => block,
                    _ => return Err(SelectionError::BlockRequired),
                };
                if !orientation.is_available_for(block) {
                    return Err(SelectionError::CourtyardRequiresBlockA);
                }
                self.orientation = Some(orientation);
                self.level = None;
            }
            Choice::Level(level) => {
                if self.inspection.is_none() || self.block.is_none() || self.orientation.is_none() {
                    return Err(SelectionError::OrientationRequired);
                }
                self.level = Some(level);
            }
        }
        Ok(())
    }

    /// Drop the level so the user can pick it again
    pub fn clear_level(&mut self) {
        self.level = None;
    }

    pub fn is_complete(&self) -> bool {
        self.complete().is_some()
    }

    /// The fully chosen location, if all four fields are set
    pub fn complete(&self) -> Option<CompleteSelection> {
        Some(CompleteSelection {
            inspection: self.inspection?,
            block: self.block?,
            orientation: self.orientation?,
            level: self.level?,
        })
    }
}

/// A selection with all four fields chosen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteSelection {
    pub inspection: Inspection,
    pub block: Block,
    pub orientation: Orientation,
    pub level: Level,
}

impl CompleteSelection {
    /// `<inspection>/<block>/<level>/<orientation>/unsorted`, relative to the storage root
    pub fn relative_dir(&self) -> PathBuf {
        [
            self.inspection.as_str().to_string(),
            self.block.as_str().to_string(),
            self.level.to_string(),
            self.orientation.as_str().to_string(),
            UNSORTED_DIR.to_string(),
        ]
        .iter()
        .collect()
    }
}

impl From<CompleteSelection> for Selection {
    fn from(complete: CompleteSelection) -> Self {
        Selection {
            inspection: Some(complete.inspection),
            block: Some(complete.block),
            orientation: Some(complete.orientation),
            level: Some(complete.level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_selection() -> Selection {
        let mut selection = Selection::default();
        selection.apply(Choice::Inspection(Inspection::BW)).unwrap();
        selection.apply(Choice::Block(Block::A)).unwrap();
        selection
            .apply(Choice::Orientation(Orientation::CourtyardEast))
            .unwrap();
        selection.apply(Choice::Level(Level::Floor(5))).unwrap();
        selection
    }

    #[test]
    fn test_relative_dir_for_courtyard() {
        let complete = full_selection().complete().unwrap();
        assert_eq!(
            complete.relative_dir(),
            PathBuf::from("BW/A/L5/Courtyard_East/unsorted")
        );
    }

    #[test]
    fn test_rechoosing_field_clears_only_dependents() {
        let mut selection = full_selection();
        selection.apply(Choice::Block(Block::A)).unwrap();
        assert_eq!(selection.inspection, Some(Inspection::BW));
        assert_eq!(selection.block, Some(Block::A));
        assert_eq!(selection.orientation, None);
        assert_eq!(selection.level, None);

        let mut selection = full_selection();
        selection.apply(Choice::Orientation(Orientation::East)).unwrap();
        assert_eq!(selection.block, Some(Block::A));
        assert_eq!(selection.level, None);

        let mut selection = full_selection();
        selection.apply(Choice::Inspection(Inspection::SR)).unwrap();
        assert_eq!(selection, Selection {
            inspection: Some(Inspection::SR),
            ..Default::default()
        });
    }

    #[test]
    fn test_rejected_choice_leaves_selection_untouched() {
        let mut selection = Selection::default();
        assert_eq!(
            selection.apply(Choice::Block(Block::B)),
            Err(SelectionError::InspectionRequired)
        );
        assert_eq!(
            selection.apply(Choice::Level(Level::Ground)),
            Err(SelectionError::OrientationRequired)
        );
        assert_eq!(selection, Selection::default());

        selection.apply(Choice::Inspection(Inspection::SR)).unwrap();
        selection.apply(Choice::Block(Block::B)).unwrap();
        let before = selection.clone();
        assert_eq!(
            selection.apply(Choice::Orientation(Orientation::CourtyardNorth)),
            Err(SelectionError::CourtyardRequiresBlockA)
        );
        assert_eq!(selection, before);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("GF".parse::<Level>(), Ok(Level::Ground));
        assert_eq!("L11".parse::<Level>(), Ok(Level::Floor(11)));
        assert!("L0".parse::<Level>().is_err());
        assert!("L12".parse::<Level>().is_err());
        assert!("5".parse::<Level>().is_err());
        assert_eq!(Level::all().len(), 12);
    }

    #[test]
    fn test_level_storage_rejects_out_of_range_floors() {
        assert_eq!(serde_json::to_string(&Level::Floor(7)).unwrap(), "\"L7\"");
        assert_eq!(serde_json::to_string(&Level::Ground).unwrap(), "\"GF\"");
        assert_eq!(serde_json::from_str::<Level>("\"L11\"").unwrap(), Level::Floor(11));

        for stored in ["\"L0\"", "\"L99\"", "{\"Floor\":99}", "\"Ground\""] {
            assert!(
                serde_json::from_str::<Level>(stored).is_err(),
                "{stored} should not load"
            );
        }

        let row = r#"{"inspection":"BW","block":"A","orientation":"North","level":"L99"}"#;
        assert!(serde_json::from_str::<Selection>(row).is_err());
    }

    #[test]
    fn test_orientation_serializes_with_directory_name() {
        let json = serde_json::to_string(&Orientation::CourtyardWest).unwrap();
        assert_eq!(json, "\"Courtyard_West\"");
        assert_eq!(
            "Courtyard_West".parse::<Orientation>(),
            Ok(Orientation::CourtyardWest)
        );
        assert_eq!(Orientation::CourtyardWest.display_name(), "Courtyard West");
    }
}
