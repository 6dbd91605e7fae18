//! Expiry status primitives.
//!
//! Every expiry carries a [`Status`] through the fit cycle. The [`Tag`] is
//! totally ordered `Ok < Warn < Fail` and a status may only be escalated,
//! never cleared, by a later stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an expiry's status.
///
/// The derived ordering is the escalation order: `Ok < Warn < Fail`.
///
/// # Examples
/// ```
/// use volfitter_core::types::Tag;
///
/// assert!(Tag::Ok < Tag::Warn);
/// assert!(Tag::Warn < Tag::Fail);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tag {
    /// Expiry is usable.
    Ok,
    /// Expiry is usable but questionable.
    Warn,
    /// Expiry must not be used downstream.
    Fail,
}

impl Tag {
    /// Upper-case label used in logs and output files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Ok => "OK",
            Tag::Warn => "WARN",
            Tag::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An expiry status: a [`Tag`] plus a human-readable reason.
///
/// # Examples
/// ```
/// use volfitter_core::types::{Status, Tag};
///
/// let status = Status::ok()
///     .escalate(Status::fail("Expired."))
///     .escalate(Status::warn("Crossed PnL: 1.50 > 1"));
///
/// assert_eq!(status.tag(), Tag::Fail);
/// assert_eq!(status.message(), "Expired.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    tag: Tag,
    message: String,
}

impl Status {
    /// Create a status with an explicit tag and message.
    pub fn new(tag: Tag, message: impl Into<String>) -> Self {
        Self {
            tag,
            message: message.into(),
        }
    }

    /// The initial status of every expiry.
    pub fn ok() -> Self {
        Self::new(Tag::Ok, "")
    }

    /// A `Warn` status with the given reason.
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Tag::Warn, message)
    }

    /// A `Fail` status with the given reason.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(Tag::Fail, message)
    }

    /// Severity tag.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Reason for the current tag (empty for a fresh `Ok`).
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the tag is `Ok`.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.tag == Tag::Ok
    }

    /// Returns `true` if the tag is `Fail`.
    #[inline]
    pub fn is_fail(&self) -> bool {
        self.tag == Tag::Fail
    }

    /// Combine with `other`, keeping whichever status is more severe.
    ///
    /// On equal tags the existing status (and its message) wins, so the
    /// first stage to raise a given severity is the one reported.
    #[must_use]
    pub fn escalate(self, other: Status) -> Status {
        if other.tag > self.tag {
            other
        } else {
            self
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::ok()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.tag)
        } else {
            write!(f, "{}: {}", self.tag, self.message)
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_status() -> impl Strategy<Value = Status> {
        prop_oneof![
            Just(Status::ok()),
            "[a-z]{0,8}".prop_map(Status::warn),
            "[a-z]{0,8}".prop_map(Status::fail),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn prop_escalate_never_decreases(a in arb_status(), b in arb_status()) {
            let before = a.tag();
            let after = a.escalate(b.clone());
            prop_assert!(after.tag() >= before);
            prop_assert!(after.tag() >= b.tag());
        }
    }
}
