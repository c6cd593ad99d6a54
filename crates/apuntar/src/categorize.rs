//! Bucketing of scored candidates for presentation.

use crate::address::{AddressKind, Candidate, Tier};
use serde::Serialize;

/// How many CSS candidates go in the primary bucket before overflowing
/// into `more_basic`.
const BASIC_LIMIT: usize = 5;

/// Scored candidates partitioned into display buckets, each sorted by
/// score descending, shorter rendering first on ties.
#[derive(Debug, Default, Serialize)]
pub struct CategorizedCandidates {
    /// Highest-scoring CSS candidates.
    pub basic: Vec<Candidate>,
    /// CSS candidates beyond the primary cut.
    pub more_basic: Vec<Candidate>,
    /// Text-anchored candidates.
    pub text: Vec<Candidate>,
    /// Structural-position candidates.
    pub positional: Vec<Candidate>,
    /// XPath candidates.
    pub xpath: Vec<Candidate>,
    /// Last-resort candidates.
    pub aggressive: Vec<Candidate>,
}

impl CategorizedCandidates {
    /// Total candidate count across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.basic.len()
            + self.more_basic.len()
            + self.text.len()
            + self.positional.len()
            + self.xpath.len()
            + self.aggressive.len()
    }

    /// Whether no candidate survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single best candidate, if any.
    #[must_use]
    pub fn best(&self) -> Option<&Candidate> {
        [
            &self.basic,
            &self.more_basic,
            &self.text,
            &self.positional,
            &self.xpath,
            &self.aggressive,
        ]
        .into_iter()
        .flatten()
        .max_by(|a, b| a.score.cmp(&b.score).then(b.rendered.len().cmp(&a.rendered.len())))
    }

    /// Iterate every candidate in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.basic
            .iter()
            .chain(&self.more_basic)
            .chain(&self.text)
            .chain(&self.positional)
            .chain(&self.xpath)
            .chain(&self.aggressive)
    }
}

fn rank(bucket: &mut [Candidate]) {
    bucket.sort_by(|a, b| b.score.cmp(&a.score).then(a.rendered.len().cmp(&b.rendered.len())));
}

/// Partition scored candidates into buckets.
#[must_use]
pub fn categorize(candidates: Vec<Candidate>) -> CategorizedCandidates {
    let mut out = CategorizedCandidates::default();
    let mut css_pool: Vec<Candidate> = Vec::new();

    for candidate in candidates {
        if candidate.address.meta.tier == Tier::Aggressive {
            out.aggressive.push(candidate);
            continue;
        }
        // Tier outranks kind: a text-constrained calendar cell is still a
        // positional answer and displays with the other structural forms.
        if candidate.address.meta.tier == Tier::Positional {
            out.positional.push(candidate);
            continue;
        }
        match candidate.kind {
            AddressKind::Css => css_pool.push(candidate),
            AddressKind::Text => out.text.push(candidate),
            AddressKind::Positional => out.positional.push(candidate),
            AddressKind::XPath => out.xpath.push(candidate),
        }
    }

    rank(&mut css_pool);
    out.more_basic = if css_pool.len() > BASIC_LIMIT {
        css_pool.split_off(BASIC_LIMIT)
    } else {
        Vec::new()
    };
    out.basic = css_pool;
    rank(&mut out.text);
    rank(&mut out.positional);
    rank(&mut out.xpath);
    rank(&mut out.aggressive);
    out
}
