//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::actions::MenuAction;
use crate::localization::{t_args_lang, t_lang};
use crate::persister::PersistProgress;
use crate::selection::{Block, CompleteSelection, Inspection, Level, Orientation, Selection};

/// Marker put in front of the chosen option of each row
pub const SELECTED_MARKER: &str = "✅";

/// Level buttons per row after the ground floor row
const LEVELS_PER_ROW: usize = 4;

/// One button of a rendered menu
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuButton {
    pub label: String,
    pub action: MenuAction,
}

impl MenuButton {
    fn new(label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Rows of buttons, independent of the Telegram types
pub type MenuLayout = Vec<Vec<MenuButton>>;

fn option_label(selected: bool, unselected_icon: Option<&str>, name: &str) -> String {
    match (selected, unselected_icon) {
        (true, _) => format!("{SELECTED_MARKER} {name}"),
        (false, Some(icon)) => format!("{icon} {name}"),
        (false, None) => name.to_string(),
    }
}

fn inspection_button(value: Inspection, selection: &Selection) -> MenuButton {
    MenuButton::new(
        option_label(selection.inspection == Some(value), None, value.as_str()),
        MenuAction::SetInspection(value),
    )
}

fn block_button(value: Block, selection: &Selection) -> MenuButton {
    MenuButton::new(
        option_label(selection.block == Some(value), None, &format!("Block {value}")),
        MenuAction::SetBlock(value),
    )
}

fn orientation_button(value: Orientation, selection: &Selection) -> MenuButton {
    let icon = if value.is_courtyard() { "🏛️" } else { "🧭" };
    MenuButton::new(
        option_label(
            selection.orientation == Some(value),
            Some(icon),
            &value.display_name(),
        ),
        MenuAction::SetOrientation(value),
    )
}

fn level_button(value: Level, selection: &Selection) -> MenuButton {
    let icon = matches!(value, Level::Ground).then_some("🏢");
    MenuButton::new(
        option_label(selection.level == Some(value), icon, &value.to_string()),
        MenuAction::SetLevel(value),
    )
}

/// Render the selection menu for the current choices.
///
/// Each row appears only once the rows above it have a choice; courtyard
/// orientations appear only for block A and the upload button only once all
/// four fields are set. Option labels are the directory names; only the
/// upload button is localized.
pub fn render_selection_menu(selection: &Selection, language_code: Option<&str>) -> MenuLayout {
    let mut rows: MenuLayout = Vec::new();

    rows.push(
        Inspection::ALL
            .iter()
            .map(|value| inspection_button(*value, selection))
            .collect(),
    );

    if selection.inspection.is_none() {
        return rows;
    }

    rows.push(
        Block::ALL
            .iter()
            .map(|value| block_button(*value, selection))
            .collect(),
    );

    let Some(block) = selection.block else {
        return rows;
    };

    let mut orientations = Orientation::CARDINAL.to_vec();
    if block.has_courtyard() {
        orientations.extend(Orientation::COURTYARD);
    }
    for pair in orientations.chunks(2) {
        rows.push(
            pair.iter()
                .map(|value| orientation_button(*value, selection))
                .collect(),
        );
    }

    if selection.orientation.is_none() {
        return rows;
    }

    let levels = Level::all();
    let (ground, floors) = levels.split_at(1);
    rows.push(vec![level_button(ground[0], selection)]);
    for chunk in floors.chunks(LEVELS_PER_ROW) {
        rows.push(
            chunk
                .iter()
                .map(|value| level_button(*value, selection))
                .collect(),
        );
    }

    if selection.is_complete() {
        rows.push(vec![MenuButton::new(
            t_lang("button-upload", language_code),
            MenuAction::Confirm,
        )]);
    }

    rows
}

/// Buttons shown with the summary before the upload step
pub fn render_confirmation_menu(language_code: Option<&str>) -> MenuLayout {
    vec![
        vec![MenuButton::new(t_lang("button-confirm", language_code), MenuAction::Confirm)],
        vec![MenuButton::new(t_lang("button-back", language_code), MenuAction::Back)],
        vec![MenuButton::new(t_lang("button-start-over", language_code), MenuAction::StartOver)],
    ]
}

/// Buttons shown while photos are expected
pub fn render_upload_prompt_menu(language_code: Option<&str>) -> MenuLayout {
    vec![vec![MenuButton::new(t_lang("button-cancel", language_code), MenuAction::Cancel)]]
}

/// Buttons shown under an upload report
pub fn render_post_upload_menu(language_code: Option<&str>) -> MenuLayout {
    vec![
        vec![MenuButton::new(t_lang("button-add-more", language_code), MenuAction::AddMore)],
        vec![MenuButton::new(t_lang("button-next-location", language_code), MenuAction::StartOver)],
    ]
}

/// Convert a rendered layout into Telegram inline keyboard markup
pub fn to_keyboard(layout: &MenuLayout) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(layout.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.action.encode()))
            .collect::<Vec<_>>()
    }))
}

/// Bullet list of the chosen location
pub fn format_location_summary(selection: &CompleteSelection, language_code: Option<&str>) -> String {
    t_args_lang(
        "location-summary",
        &[
            ("inspection", selection.inspection.as_str()),
            ("block", selection.block.as_str()),
            ("orientation", &selection.orientation.display_name()),
            ("level", &selection.level.to_string()),
        ],
        language_code,
    )
}

/// Save path as shown to the user
pub fn format_save_path(selection: &CompleteSelection) -> String {
    format!(
        "{}/{}/",
        crate::persister::STORAGE_DIR,
        selection.relative_dir().display()
    )
}

pub fn format_confirmation(selection: &CompleteSelection, language_code: Option<&str>) -> String {
    t_args_lang(
        "confirm-message",
        &[
            ("summary", &format_location_summary(selection, language_code)),
            ("path", &format_save_path(selection)),
        ],
        language_code,
    )
}

pub fn format_upload_prompt(
    selection: &CompleteSelection,
    more: bool,
    language_code: Option<&str>,
) -> String {
    let key = if more { "ready-for-more-photos" } else { "ready-for-photos" };
    t_args_lang(
        key,
        &[("summary", &format_location_summary(selection, language_code))],
        language_code,
    )
}

pub fn format_progress(progress: &PersistProgress, language_code: Option<&str>) -> String {
    t_args_lang(
        "saving-progress",
        &[
            ("total", &progress.total.to_string()),
            ("processed", &progress.processed.to_string()),
            ("saved", &progress.saved.to_string()),
            ("failed", &progress.failed.to_string()),
        ],
        language_code,
    )
}

pub fn format_upload_report(
    selection: &CompleteSelection,
    saved: usize,
    failed: usize,
    language_code: Option<&str>,
) -> String {
    let mut report = t_args_lang(
        "upload-complete",
        &[
            ("summary", &format_location_summary(selection, language_code)),
            ("saved", &saved.to_string()),
            ("failed", &failed.to_string()),
            ("path", &format_save_path(selection)),
        ],
        language_code,
    );

    if failed > 0 {
        report.push_str("\n\n");
        report.push_str(&t_args_lang(
            "upload-failed-warning",
            &[("failed", &failed.to_string())],
            language_code,
        ));
    }

    report
}
