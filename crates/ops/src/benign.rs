//! Remote failures accepted as success when staging through the promote API
//!
//! Each entry names one package and a fragment of the remote failure message
//! that the remote service reports for it even though the holding package is
//! staged correctly. The table is consulted for promote-API holding imports
//! only and is matched exactly on the unique name.

/// `(unique name, message fragment)`
// TODO: remove the entry once the remote service stops reporting the
// duplicate-component failure for staged ActivityFeeds holding imports.
pub const BENIGN_HOLDING_FAILURES: &[(&str, &str)] = &[(
    "ActivityFeeds",
    "is already a member of solution ActivityFeeds_Upgrade",
)];

/// Whether a failed holding import of `unique_name` is a known benign failure
#[must_use]
pub fn is_benign_holding_failure(unique_name: &str, message: &str) -> bool {
    BENIGN_HOLDING_FAILURES
        .iter()
        .any(|(name, fragment)| *name == unique_name && message.contains(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_requires_name_and_fragment() {
        let message =
            "Component 4f1c is already a member of solution ActivityFeeds_Upgrade and cannot be added";
        assert!(is_benign_holding_failure("ActivityFeeds", message));
        assert!(!is_benign_holding_failure("Core", message));
        assert!(!is_benign_holding_failure("ActivityFeeds", "dependency missing"));
    }
}
