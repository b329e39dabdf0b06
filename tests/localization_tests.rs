//! # Localization Tests
//!
//! Message retrieval and formatting against the bundled English catalogue.

use facade_sorter::localization::{t_args_lang, t_lang, LocalizationManager};
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("help-message", "en", None);
        assert!(message.contains("/start"));
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "en", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_get_message_unsupported_language() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("button-back", "unsupported", None);
        assert_eq!(message, manager.get_message_in_language("button-back", "en", None));
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("total", "12");
        args.insert("processed", "6");
        args.insert("saved", "5");
        args.insert("failed", "1");

        let message = manager.get_message_in_language("saving-progress", "en", Some(&args));
        assert!(message.contains("12"));
        assert!(message.contains("6"));
        assert!(message.contains("5"));
    }

    #[test]
    fn test_paths_are_not_wrapped_in_isolation_marks() {
        let message = t_args_lang(
            "upload-failed-warning",
            &[("failed", "2")],
            Some("en-US"),
        );
        assert!(message.contains('2'));
        assert!(!message.contains('\u{2068}'));
    }

    #[test]
    fn test_every_ui_key_is_present() {
        let keys = [
            "welcome-message",
            "cancel-message",
            "scheme-not-found",
            "toast-back",
            "toast-start-over",
            "toast-ready",
            "toast-cancelled",
            "error-select-inspection-first",
            "error-select-block-first",
            "error-select-orientation-first",
            "error-courtyard-block-a",
            "error-selection-incomplete",
            "error-invalid-action",
            "error-saving-photos",
            "error-missing-selection",
            "photos-not-expected",
            "text-during-upload",
            "text-response",
            "unsupported-message",
            "error-processing-failed",
            "button-upload",
            "button-confirm",
            "button-back",
            "button-start-over",
            "button-cancel",
            "button-add-more",
            "button-next-location",
        ];
        for key in keys {
            let message = t_lang(key, None);
            assert!(!message.starts_with("Missing"), "{key} has no translation");
        }
    }
}
