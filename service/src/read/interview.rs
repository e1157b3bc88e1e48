//! [`InterviewRecord`] read model definition.

use crate::domain::{identity, interview, InterviewRecord};

pub mod list {
    //! [`InterviewRecord`]s list definitions.

    use crate::domain::{identity, interview::Score, InterviewRecord};

    /// Maximum number of [`InterviewRecord`]s in a history [`Page`].
    pub const HISTORY_LIMIT: u16 = 50;

    /// Selector of an [`identity::Identity`]'s [`InterviewRecord`]s, newest
    /// first.
    #[derive(Clone, Copy, Debug)]
    pub struct Selector {
        /// ID of the [`identity::Identity`] owning the records.
        pub owner: identity::Id,

        /// Maximum number of records to select.
        pub limit: u16,
    }

    impl Selector {
        /// Creates a new [`Selector`] of the provided `owner`'s history.
        #[must_use]
        pub fn history(owner: identity::Id) -> Self {
            Self {
                owner,
                limit: HISTORY_LIMIT,
            }
        }
    }

    /// History page of [`InterviewRecord`]s.
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Page {
        /// [`InterviewRecord`]s ordered by creation time, newest first.
        pub records: Vec<InterviewRecord>,

        /// Rounded average [`Score`] of the `records`.
        pub average_score: u8,
    }

    impl From<Vec<InterviewRecord>> for Page {
        fn from(records: Vec<InterviewRecord>) -> Self {
            let average_score =
                Score::average(records.iter().map(|r| r.score)).into();
            Self {
                records,
                average_score,
            }
        }
    }
}

/// Selector of a single [`InterviewRecord`] owned by an
/// [`identity::Identity`].
#[derive(Clone, Copy, Debug)]
pub struct Owned {
    /// ID of the [`identity::Identity`] that must own the record.
    pub owner: identity::Id,

    /// ID of the requested [`InterviewRecord`].
    pub id: interview::Id,
}

/// What a client asks to read from its own [`InterviewRecord`]s.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Request {
    /// History of the most recent records.
    List,

    /// Single record by its ID.
    Detail(interview::Id),

    /// Detail view of a record whose ID could not be understood.
    UnknownRecord,
}

impl Request {
    /// Discriminator value selecting the detail view.
    pub const DETAIL_VIEW: &'static str = "detail";

    /// Interprets the untrusted `view` and `id` request parameters.
    ///
    /// Anything but the `detail` view is a [`Request::List`].
    #[must_use]
    pub fn from_params(view: Option<&str>, id: Option<&str>) -> Self {
        if view != Some(Self::DETAIL_VIEW) {
            return Self::List;
        }
        id.and_then(interview::Id::parse)
            .map_or(Self::UnknownRecord, Self::Detail)
    }
}

/// Outcome of reading [`InterviewRecord`]s.
#[derive(Clone, Debug, PartialEq)]
pub enum Records {
    /// History page.
    List(list::Page),

    /// Single record, if it exists and is owned by the requester.
    Detail(Option<InterviewRecord>),
}

#[cfg(test)]
mod tests {
    use crate::domain::interview;

    use super::Request;

    #[test]
    fn interprets_view_params() {
        assert_eq!(Request::from_params(None, None), Request::List);
        assert_eq!(Request::from_params(Some("list"), Some("3")), Request::List);
        assert_eq!(Request::from_params(Some("Detail"), Some("3")), Request::List);
        assert_eq!(
            Request::from_params(Some("detail"), Some("3")),
            Request::Detail(interview::Id::new(3).unwrap()),
        );
        assert_eq!(
            Request::from_params(Some("detail"), Some("abc")),
            Request::UnknownRecord,
        );
        assert_eq!(
            Request::from_params(Some("detail"), None),
            Request::UnknownRecord,
        );
    }
}
