//! Expertise Matcher — decides which open requests a guide can take.
//!
//! Matching is exact set membership after folding both sides with
//! `normalize_field` (trim + lowercase). No substring or fuzzy matching.
//! There is no persistent index: matches are recomputed on every read.

use std::collections::BTreeSet;

use crate::mentorship::request::MentorshipRequest;

/// Folds a career field name for comparison.
pub fn normalize_field(field: &str) -> String {
    field.trim().to_lowercase()
}

/// The normalized set of career fields a guide claims competence in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpertiseSet(BTreeSet<String>);

impl ExpertiseSet {
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(&normalize_field(field))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Normalized fields in sorted order, ready to store.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExpertiseSet {
    /// Blank entries are dropped; duplicates that fold together collapse.
    fn from_iter<I: IntoIterator<Item = S>>(fields: I) -> Self {
        Self(
            fields
                .into_iter()
                .map(|f| normalize_field(f.as_ref()))
                .filter(|f| !f.is_empty())
                .collect(),
        )
    }
}

/// Returns the open requests whose field is in the guide's expertise,
/// keeping the input order.
pub fn find_matches<'a>(
    expertise: &ExpertiseSet,
    requests: &'a [MentorshipRequest],
) -> Vec<&'a MentorshipRequest> {
    requests
        .iter()
        .filter(|r| r.is_open())
        .filter(|r| expertise.contains(&r.field))
        .collect()
}

/// The request board as one user sees it. Anyone without a guide profile,
/// unknown users included, is offered nothing.
pub fn offered_requests(
    expertise_fields: Option<&[String]>,
    open: &[MentorshipRequest],
) -> Vec<MentorshipRequest> {
    let Some(fields) = expertise_fields else {
        return Vec::new();
    };
    let expertise: ExpertiseSet = fields.iter().collect();
    find_matches(&expertise, open).into_iter().cloned().collect()
}
