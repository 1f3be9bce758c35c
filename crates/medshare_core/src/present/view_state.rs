//! Request-scoped view state.
//!
//! Replaces "empty map means still loading" with an explicit state.

use crate::model::aggregate::{AggregateResult, ShareView};
use crate::present::summary::{render_summary, SummaryView};
use crate::service::share_view_service::{ShareViewError, ShareViewErrorKind};

const MSG_LOADING: &str = "Loading...";

/// What the share view currently shows for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Aggregation has not settled yet.
    Pending,
    /// No token presented; render nothing.
    NoDataRequested,
    Ready(AggregateResult),
    Failed(ShareViewErrorKind),
}

impl ViewState {
    /// Folds the aggregator outcome into a settled state.
    pub fn from_outcome(outcome: Result<ShareView, ShareViewError>) -> Self {
        match outcome {
            Ok(ShareView::NoDataRequested) => Self::NoDataRequested,
            Ok(ShareView::Completed(result)) => Self::Ready(result),
            Err(err) => Self::Failed(err.kind()),
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Status line to show instead of (or before) the summary.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Pending => Some(MSG_LOADING),
            Self::Failed(kind) => Some(kind.user_message()),
            Self::NoDataRequested | Self::Ready(_) => None,
        }
    }

    pub fn summary(&self) -> Option<SummaryView> {
        match self {
            Self::Ready(result) => Some(render_summary(result)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ViewState, MSG_LOADING};
    use crate::model::aggregate::{AggregateResult, ShareView};
    use crate::model::share_token::InvalidTokenReason;
    use crate::repo::error::RepoError;
    use crate::service::share_view_service::{ShareViewError, ShareViewErrorKind};

    #[test]
    fn pending_shows_loading_and_no_summary() {
        let state = ViewState::Pending;
        assert!(!state.is_settled());
        assert_eq!(state.message(), Some(MSG_LOADING));
        assert!(state.summary().is_none());
    }

    #[test]
    fn failures_map_to_user_messages() {
        let invalid =
            ViewState::from_outcome(Err(ShareViewError::InvalidToken(InvalidTokenReason::Expired)));
        assert_eq!(invalid, ViewState::Failed(ShareViewErrorKind::InvalidToken));
        assert_eq!(invalid.message(), Some("Invalid or expired token."));

        let transient = ViewState::from_outcome(Err(ShareViewError::TransientFailure(
            RepoError::TimedOut { timeout_ms: 5 },
        )));
        assert_eq!(
            transient.message(),
            Some("An error occurred while fetching data.")
        );
    }

    #[test]
    fn no_data_requested_renders_nothing() {
        let state = ViewState::from_outcome(Ok(ShareView::NoDataRequested));
        assert!(state.is_settled());
        assert_eq!(state.message(), None);
        assert!(state.summary().is_none());
    }

    #[test]
    fn ready_state_renders_summary_without_message() {
        let state = ViewState::from_outcome(Ok(ShareView::Completed(AggregateResult::new())));
        assert_eq!(state.message(), None);
        assert!(state.summary().is_some());
    }
}
