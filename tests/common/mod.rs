//! Helpers shared by the integration tests

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use facade_sorter::persister::{Attachment, AttachmentKind};
use facade_sorter::selection::{Block, Inspection, Level, Orientation, Selection};

/// Every selection reachable through the menu, from empty to complete
pub fn all_selections() -> Vec<Selection> {
    let mut selections = vec![Selection::default()];

    for inspection in Inspection::ALL {
        selections.push(Selection {
            inspection: Some(inspection),
            ..Default::default()
        });

        for block in Block::ALL {
            selections.push(Selection {
                inspection: Some(inspection),
                block: Some(block),
                ..Default::default()
            });

            for orientation in Orientation::CARDINAL
                .into_iter()
                .chain(Orientation::COURTYARD)
                .filter(|o| o.is_available_for(block))
            {
                let partial = Selection {
                    inspection: Some(inspection),
                    block: Some(block),
                    orientation: Some(orientation),
                    level: None,
                };
                selections.push(partial.clone());

                for level in Level::all() {
                    selections.push(Selection {
                        level: Some(level),
                        ..partial.clone()
                    });
                }
            }
        }
    }

    selections
}

pub fn photo(unique_id: &str) -> Attachment {
    Attachment {
        kind: AttachmentKind::Photo,
        source_id: format!("file-{unique_id}"),
        unique_id: unique_id.to_string(),
        width: Some(1280),
        height: Some(960),
        byte_size: Some(204_800),
        received_at: Utc.with_ymd_and_hms(2025, 6, 2, 9, 30, 0).unwrap(),
        original_filename: None,
    }
}

pub fn document(unique_id: &str, file_name: &str) -> Attachment {
    Attachment {
        kind: AttachmentKind::Document,
        width: None,
        height: None,
        original_filename: Some(file_name.to_string()),
        ..photo(unique_id)
    }
}
