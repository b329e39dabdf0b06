//! # Error Types Module
//!
//! Error types shared across the selection flow, the callback payload codec,
//! the file persister and configuration loading.

/// A menu choice made before the fields it depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    /// Block chosen before inspection
    InspectionRequired,
    /// Orientation chosen before inspection and block
    BlockRequired,
    /// Level chosen before orientation
    OrientationRequired,
    /// Courtyard orientation chosen for a block without a courtyard
    CourtyardRequiresBlockA,
    /// Upload requested before all four fields are set
    Incomplete,
}

impl SelectionError {
    /// Localization key of the message shown to the user
    pub fn message_key(&self) -> &'static str {
        match self {
            SelectionError::InspectionRequired => "error-select-inspection-first",
            SelectionError::BlockRequired => "error-select-block-first",
            SelectionError::OrientationRequired => "error-select-orientation-first",
            SelectionError::CourtyardRequiresBlockA => "error-courtyard-block-a",
            SelectionError::Incomplete => "error-selection-incomplete",
        }
    }
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::InspectionRequired => write!(f, "inspection must be selected first"),
            SelectionError::BlockRequired => {
                write!(f, "inspection and block must be selected first")
            }
            SelectionError::OrientationRequired => {
                write!(f, "inspection, block and orientation must be selected first")
            }
            SelectionError::CourtyardRequiresBlockA => {
                write!(f, "courtyard orientations are only available for block A")
            }
            SelectionError::Incomplete => write!(f, "selection is incomplete"),
        }
    }
}

impl std::error::Error for SelectionError {}

/// Callback data that does not decode to a known menu action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionParseError(pub String);

impl std::fmt::Display for ActionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid action payload: {}", self.0)
    }
}

impl std::error::Error for ActionParseError {}

/// Failures that abort a whole persist operation.
///
/// Failures of individual attachments are counted in the report instead.
#[derive(Debug, Clone)]
pub enum PersistError {
    /// Target directory could not be created
    CreateDirectory(String),
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::CreateDirectory(msg) => write!(f, "Directory creation error: {msg}"),
        }
    }
}

impl std::error::Error for PersistError {}

/// Invalid or missing configuration values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value } => write!(f, "Invalid value for {key}: {value}"),
        }
    }
}

impl std::error::Error for ConfigError {}
