//! Legal transition tables for locally initiated status changes.

use super::{SourceStatus, TargetStatus};

/// Returns true if the source may move from `from` to `to` by a local action.
pub fn source_transition_allowed(from: SourceStatus, to: SourceStatus) -> bool {
    use SourceStatus::*;

    if from == to || to.is_side_state() {
        return true;
    }

    match from {
        Untracked => matches!(to, Request | Edited | Importing | Current),
        Request => matches!(to, Importing | Current | Untracked),
        Edited => matches!(to, Importing | Current),
        Importing => matches!(to, Current | Edited),
        Current => matches!(to, Edited | Importing),
        Error => matches!(to, Request | Edited | Importing | Current),
        Cancelled => matches!(to, Importing | Current | Untracked),
        Disabled => matches!(to, Current | Untracked),
    }
}

/// Returns true if a target may move from `from` (absent when `None`) to
/// `to` by a local action.
pub fn target_transition_allowed(from: Option<TargetStatus>, to: TargetStatus) -> bool {
    use TargetStatus::*;

    if to.is_side_state() || from == Some(to) {
        return true;
    }

    let Some(from) = from else {
        return matches!(to, Request | Pending);
    };

    match from {
        Request => matches!(to, Pending),
        Untracked => matches!(to, Request | Pending),
        Pending => matches!(to, Ready | Intermediate | Current | Request),
        Ready => matches!(to, Current | Intermediate),
        Intermediate => matches!(to, Ready | Current | Pending),
        Current => matches!(to, Edited | Pending | Request),
        Edited => matches!(to, Request | Pending | Ready | Current),
        Error => matches!(to, Request | Pending | Ready | Intermediate | Current),
        Cancelled => matches!(to, Request | Pending),
        Disabled => matches!(to, Request | Pending | Current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_states_always_reachable() {
        for from in [
            SourceStatus::Untracked,
            SourceStatus::Current,
            SourceStatus::Importing,
            SourceStatus::Disabled,
        ] {
            assert!(source_transition_allowed(from, SourceStatus::Error));
            assert!(source_transition_allowed(from, SourceStatus::Cancelled));
            assert!(source_transition_allowed(from, SourceStatus::Disabled));
        }
        for from in [
            None,
            Some(TargetStatus::Ready),
            Some(TargetStatus::Current),
        ] {
            assert!(target_transition_allowed(from, TargetStatus::Error));
            assert!(target_transition_allowed(from, TargetStatus::Untracked));
            assert!(target_transition_allowed(from, TargetStatus::Disabled));
        }
    }

    #[test]
    fn test_source_happy_path() {
        assert!(source_transition_allowed(
            SourceStatus::Untracked,
            SourceStatus::Importing
        ));
        assert!(source_transition_allowed(
            SourceStatus::Importing,
            SourceStatus::Current
        ));
        assert!(source_transition_allowed(
            SourceStatus::Current,
            SourceStatus::Edited
        ));
        assert!(source_transition_allowed(
            SourceStatus::Edited,
            SourceStatus::Importing
        ));
    }

    #[test]
    fn test_source_illegal_moves() {
        assert!(!source_transition_allowed(
            SourceStatus::Current,
            SourceStatus::Untracked
        ));
        assert!(!source_transition_allowed(
            SourceStatus::Edited,
            SourceStatus::Request
        ));
    }

    #[test]
    fn test_target_happy_path() {
        assert!(target_transition_allowed(None, TargetStatus::Request));
        assert!(target_transition_allowed(
            Some(TargetStatus::Request),
            TargetStatus::Pending
        ));
        assert!(target_transition_allowed(
            Some(TargetStatus::Pending),
            TargetStatus::Ready
        ));
        assert!(target_transition_allowed(
            Some(TargetStatus::Ready),
            TargetStatus::Current
        ));
        assert!(target_transition_allowed(
            Some(TargetStatus::Current),
            TargetStatus::Edited
        ));
    }

    #[test]
    fn test_target_illegal_moves() {
        assert!(!target_transition_allowed(None, TargetStatus::Ready));
        assert!(!target_transition_allowed(
            Some(TargetStatus::Request),
            TargetStatus::Current
        ));
        assert!(!target_transition_allowed(
            Some(TargetStatus::Cancelled),
            TargetStatus::Ready
        ));
        assert!(!target_transition_allowed(
            Some(TargetStatus::Ready),
            TargetStatus::Pending
        ));
    }
}
