//! Dialogue Manager module for handling dialogue state transitions
//!
//! `transition` decides the next session and what the chat should show for
//! a menu action. It performs no I/O, so the whole flow is testable without
//! Telegram or a state store.

use crate::actions::MenuAction;
use crate::dialogue::{ConfirmationMode, Session, UploadState};
use crate::errors::SelectionError;
use crate::selection::{Block, Choice, CompleteSelection};

/// What the Telegram layer has to draw after a transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScreenEffect {
    /// Update the buttons of the current menu message
    RedrawMenu,
    /// Replace the menu message; shows the block scheme when a block is given,
    /// the general scheme otherwise
    ResendMenu { scheme: Option<Block> },
    /// Show the summary with confirm/back/start-over buttons
    ShowConfirmation(CompleteSelection),
    /// Ask for photos for this location
    AwaitPhotos { selection: CompleteSelection, more: bool },
    /// Session dropped
    Cancelled,
}

/// Result of applying one action
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Session to store; `None` deletes it
    pub session: Option<Session>,
    pub effect: ScreenEffect,
}

impl Transition {
    fn keep(session: Session, effect: ScreenEffect) -> Self {
        Self {
            session: Some(session),
            effect,
        }
    }
}

/// Apply a menu action to a session.
///
/// A choice whose prerequisites are missing is rejected and the caller keeps
/// the session as it was.
pub fn transition(
    session: &Session,
    action: MenuAction,
    mode: ConfirmationMode,
) -> Result<Transition, SelectionError> {
    let mut next = session.clone();

    match action {
        MenuAction::SetInspection(value) => apply_choice(next, Choice::Inspection(value), mode),
        MenuAction::SetBlock(value) => apply_choice(next, Choice::Block(value), mode),
        MenuAction::SetOrientation(value) => apply_choice(next, Choice::Orientation(value), mode),
        MenuAction::SetLevel(value) => apply_choice(next, Choice::Level(value), mode),
        MenuAction::Confirm | MenuAction::AddMore => {
            let complete = next.selection.complete().ok_or(SelectionError::Incomplete)?;
            next.state = UploadState::WaitingForPhotos;
            Ok(Transition::keep(
                next,
                ScreenEffect::AwaitPhotos {
                    selection: complete,
                    more: action == MenuAction::AddMore,
                },
            ))
        }
        MenuAction::Back => {
            next.selection.clear_level();
            next.state = UploadState::SelectingParameters;
            let scheme = next.selection.block;
            Ok(Transition::keep(next, ScreenEffect::ResendMenu { scheme }))
        }
        MenuAction::StartOver => Ok(Transition::keep(
            Session {
                chat_id: session.chat_id,
                language_code: session.language_code.clone(),
                ..Default::default()
            },
            ScreenEffect::ResendMenu { scheme: None },
        )),
        MenuAction::Cancel => Ok(Transition {
            session: None,
            effect: ScreenEffect::Cancelled,
        }),
    }
}

fn apply_choice(
    mut next: Session,
    choice: Choice,
    mode: ConfirmationMode,
) -> Result<Transition, SelectionError> {
    next.selection.apply(choice)?;

    if let Some(complete) = next.selection.complete() {
        return Ok(match mode {
            ConfirmationMode::Immediate => {
                next.state = UploadState::WaitingForPhotos;
                Transition::keep(
                    next,
                    ScreenEffect::AwaitPhotos {
                        selection: complete,
                        more: false,
                    },
                )
            }
            ConfirmationMode::Confirm => {
                next.state = UploadState::ConfirmingSelection;
                Transition::keep(next, ScreenEffect::ShowConfirmation(complete))
            }
        });
    }

    next.state = UploadState::SelectingParameters;
    let effect = match choice {
        Choice::Block(block) => ScreenEffect::ResendMenu {
            scheme: Some(block),
        },
        _ => ScreenEffect::RedrawMenu,
    };
    Ok(Transition::keep(next, effect))
}
