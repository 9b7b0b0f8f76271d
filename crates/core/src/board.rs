//! Agency workboard column layout.
//!
//! Each column shows one or more request statuses and has a single target
//! status that a card dropped into it should move to.

use crate::request_status::RequestStatus;

/// One column of the workboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardColumn {
    pub id: &'static str,
    pub title: &'static str,
    /// Statuses whose cards are shown in this column.
    pub statuses: &'static [RequestStatus],
    /// Status a card takes when dropped here.
    pub target_status: RequestStatus,
}

impl BoardColumn {
    pub fn contains(&self, status: RequestStatus) -> bool {
        self.statuses.contains(&status)
    }
}

/// Well-known column ids.
pub mod column_ids {
    pub const BACKLOG: &str = "backlog";
    pub const IN_PROGRESS: &str = "in_progress";
    pub const REVIEW: &str = "review";
    pub const DELIVERED: &str = "delivered";
    pub const DONE: &str = "done";
}

/// The fixed, ordered column layout. DECLINED requests have no column.
pub const DEFAULT_COLUMNS: &[BoardColumn] = &[
    BoardColumn {
        id: column_ids::BACKLOG,
        title: "Backlog",
        statuses: &[
            RequestStatus::New,
            RequestStatus::Queued,
            RequestStatus::Quoted,
            RequestStatus::Accepted,
        ],
        target_status: RequestStatus::Queued,
    },
    BoardColumn {
        id: column_ids::IN_PROGRESS,
        title: "In Progress",
        statuses: &[RequestStatus::InProgress, RequestStatus::NeedsInfo],
        target_status: RequestStatus::InProgress,
    },
    BoardColumn {
        id: column_ids::REVIEW,
        title: "In Review",
        statuses: &[RequestStatus::InReview],
        target_status: RequestStatus::InReview,
    },
    BoardColumn {
        id: column_ids::DELIVERED,
        title: "Delivered",
        statuses: &[RequestStatus::Delivered],
        target_status: RequestStatus::Delivered,
    },
    BoardColumn {
        id: column_ids::DONE,
        title: "Done",
        statuses: &[RequestStatus::Closed, RequestStatus::Paid],
        target_status: RequestStatus::Closed,
    },
];

/// The column showing `status`, if any.
pub fn column_for_status(
    columns: &'static [BoardColumn],
    status: RequestStatus,
) -> Option<&'static BoardColumn> {
    columns.iter().find(|c| c.contains(status))
}

/// Look up a column by id.
pub fn find_column(columns: &'static [BoardColumn], id: &str) -> Option<&'static BoardColumn> {
    columns.iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_status_except_declined_has_exactly_one_column() {
        for status in RequestStatus::ALL {
            let count = DEFAULT_COLUMNS.iter().filter(|c| c.contains(status)).count();
            let expected = usize::from(status != RequestStatus::Declined);
            assert_eq!(count, expected, "status {status}");
        }
    }

    #[test]
    fn column_ids_are_unique() {
        let ids: HashSet<_> = DEFAULT_COLUMNS.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), DEFAULT_COLUMNS.len());
    }

    #[test]
    fn target_status_is_shown_in_its_own_column() {
        for column in DEFAULT_COLUMNS {
            assert!(column.contains(column.target_status), "column {}", column.id);
        }
    }

    #[test]
    fn lookup_helpers() {
        let review = column_for_status(DEFAULT_COLUMNS, RequestStatus::InReview).unwrap();
        assert_eq!(review.id, column_ids::REVIEW);
        assert!(column_for_status(DEFAULT_COLUMNS, RequestStatus::Declined).is_none());
        assert_eq!(
            find_column(DEFAULT_COLUMNS, column_ids::DONE).unwrap().target_status,
            RequestStatus::Closed
        );
        assert!(find_column(DEFAULT_COLUMNS, "archive").is_none());
    }
}
