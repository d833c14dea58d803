//! Bounded-edit-distance search for short technical sequences.
//!
//! A [`FuzzyPattern`] is a chain of elements. The leading literal is found with
//! Myers' bit-parallel algorithm; every following element has to match directly
//! after the previous one. This covers the adapter layouts of the multiome kit,
//! for example `(AGATCTACAC){e<=2}([ACGTN]{16})(CGCGTCTGTCGTCGGCAGCG){e<=3}`.
//!
//! `N` bases in the searched text match every pattern base at no cost.

use bio::alignment::Alignment;
use bio::pattern_matching::myers::{Myers, MyersBuilder};
use read_seq::{OrientedRead, Read, Strand};
use std::fmt;
use thiserror::Error;

//------------------ CONSTANTS -----------------------//
// Myers with a 64 bit vector handles literals up to this length
const MAX_LITERAL_LEN: usize = 64;

const LITERAL_BASES: &[u8] = b"ACGT";
const WILDCARD_BASES: &[u8] = b"ACGTN";
const TEXT_WILDCARD: u8 = b'N';
//----------------END OF CONSTANTS--------------------//

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern has no elements")]
    Empty,
    #[error("pattern must start with a literal")]
    LeadingWildcard,
    #[error("literal {0} contains characters other than ACGT")]
    InvalidLiteral(String),
    #[error("literal {0} is longer than {MAX_LITERAL_LEN} bases")]
    LiteralTooLong(String),
    #[error("literal {seq} cannot allow {max_edits} edits")]
    BudgetTooLarge { seq: String, max_edits: u8 },
    #[error("wildcard of length zero")]
    EmptyWildcard,
}

/// One element of a [`FuzzyPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternElement {
    /// A literal with its own edit budget. A budget of zero is an exact match.
    Literal { seq: Vec<u8>, max_edits: u8 },
    /// A fixed number of arbitrary `ACGTN` bases.
    Wildcard { len: usize },
}

impl PatternElement {
    pub fn fuzzy(seq: &[u8], max_edits: u8) -> Self {
        PatternElement::Literal {
            seq: seq.to_ascii_uppercase(),
            max_edits,
        }
    }

    pub fn exact(seq: &[u8]) -> Self {
        Self::fuzzy(seq, 0)
    }

    pub fn wildcard(len: usize) -> Self {
        PatternElement::Wildcard { len }
    }

    fn validate(&self) -> Result<(), PatternError> {
        match self {
            PatternElement::Literal { seq, max_edits } => {
                let text = || String::from_utf8_lossy(seq).into_owned();
                if seq.is_empty() || !seq.iter().all(|b| LITERAL_BASES.contains(b)) {
                    return Err(PatternError::InvalidLiteral(text()));
                }
                if seq.len() > MAX_LITERAL_LEN {
                    return Err(PatternError::LiteralTooLong(text()));
                }
                if usize::from(*max_edits) >= seq.len() {
                    return Err(PatternError::BudgetTooLarge {
                        seq: text(),
                        max_edits: *max_edits,
                    });
                }
                Ok(())
            }
            PatternElement::Wildcard { len: 0 } => Err(PatternError::EmptyWildcard),
            PatternElement::Wildcard { .. } => Ok(()),
        }
    }
}

/// A hit of a [`FuzzyPattern`], as a half-open range over the searched sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorMatch {
    pub start: usize,
    pub end: usize,
    /// Total edits spent over all literals of the pattern.
    pub dist: u8,
}

impl AnchorMatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    fn shifted(self, offset: usize) -> Self {
        AnchorMatch {
            start: self.start + offset,
            end: self.end + offset,
            dist: self.dist,
        }
    }
}

/// A compiled, immutable approximate-matching pattern.
#[derive(Clone)]
pub struct FuzzyPattern {
    elements: Vec<PatternElement>,
    core: Myers<u64>,
    core_max_edits: u8,
}

impl fmt::Debug for FuzzyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuzzyPattern")
            .field("elements", &self.elements)
            .finish()
    }
}

impl FuzzyPattern {
    pub fn new(elements: Vec<PatternElement>) -> Result<Self, PatternError> {
        for element in &elements {
            element.validate()?;
        }
        let (core, core_max_edits) = match elements.first() {
            None => return Err(PatternError::Empty),
            Some(PatternElement::Wildcard { .. }) => return Err(PatternError::LeadingWildcard),
            Some(PatternElement::Literal { seq, max_edits }) => (
                MyersBuilder::new()
                    .text_wildcard(TEXT_WILDCARD)
                    .build_64(seq.iter().copied()),
                *max_edits,
            ),
        };
        Ok(FuzzyPattern {
            elements,
            core,
            core_max_edits,
        })
    }

    /// A pattern made of a single fuzzy literal.
    pub fn literal(seq: &[u8], max_edits: u8) -> Result<Self, PatternError> {
        Self::new(vec![PatternElement::fuzzy(seq, max_edits)])
    }

    pub fn elements(&self) -> &[PatternElement] {
        &self.elements
    }

    /// Return the first match in `seq`, which must be upper case.
    ///
    /// Hits of the leading literal come in runs of adjacent end positions. Runs
    /// are visited left to right and, within a run, candidates are tried from
    /// the smallest edit distance up until the rest of the chain matches.
    pub fn find(&self, seq: &[u8]) -> Option<AnchorMatch> {
        // the lazy traceback mutates the search state
        let mut myers = self.core.clone();
        let mut matches = myers.find_all_lazy(seq, self.core_max_edits);
        let hits: Vec<(usize, u8)> = matches.by_ref().collect();

        let mut aln = Alignment::default();
        for run in hit_runs(&hits) {
            let mut candidates = run.to_vec();
            candidates.sort_by_key(|&(end, dist)| (dist, end));
            for (end, dist) in candidates {
                if !matches.alignment_at(end, &mut aln) {
                    continue;
                }
                if let Some((tail_end, tail_dist)) = self.match_tail(seq, aln.yend) {
                    return Some(AnchorMatch {
                        start: aln.ystart,
                        end: tail_end,
                        dist: dist.saturating_add(tail_dist),
                    });
                }
            }
        }
        None
    }

    /// Return all non-overlapping matches in `seq`, left to right.
    pub fn find_all(&self, seq: &[u8]) -> Vec<AnchorMatch> {
        let mut found = Vec::new();
        let mut offset = 0;
        while offset < seq.len() {
            let Some(hit) = self.find(&seq[offset..]) else {
                break;
            };
            let hit = hit.shifted(offset);
            offset = hit.end;
            found.push(hit);
        }
        found
    }

    /// Search the forward strand of `read`, then its reverse complement.
    pub fn find_stranded<'a>(&self, read: &'a Read) -> Option<(OrientedRead<'a>, AnchorMatch)> {
        search_strands(read, |oriented| self.find(&oriented.seq))
    }

    // Match the elements after the leading literal, starting at `pos`.
    fn match_tail(&self, seq: &[u8], mut pos: usize) -> Option<(usize, u8)> {
        let mut total = 0u8;
        for element in &self.elements[1..] {
            match element {
                PatternElement::Wildcard { len } => {
                    let end = pos + len;
                    if end > seq.len() || !seq[pos..end].iter().all(|b| WILDCARD_BASES.contains(b)) {
                        return None;
                    }
                    pos = end;
                }
                PatternElement::Literal { seq: lit, max_edits } => {
                    let (consumed, dist) = anchored_match(lit, &seq[pos..], *max_edits)?;
                    pos += consumed;
                    total = total.saturating_add(dist);
                }
            }
        }
        Some((pos, total))
    }
}

/// Several independent patterns searched in the same read, for example the two
/// orientations of the Tn5 mosaic end.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<FuzzyPattern>,
}

impl PatternSet {
    pub fn new(patterns: Vec<FuzzyPattern>) -> Self {
        PatternSet { patterns }
    }

    /// All non-overlapping hits of every member pattern, grouped by pattern.
    pub fn find_all(&self, seq: &[u8]) -> Vec<AnchorMatch> {
        self.patterns.iter().flat_map(|p| p.find_all(seq)).collect()
    }
}

/// Run `search` on the forward strand of `read` and, if that yields nothing, on
/// the reverse complement. The oriented read that produced the hit is returned
/// with it, coordinates in the hit are local to that strand.
pub fn search_strands<'a, T>(
    read: &'a Read,
    mut search: impl FnMut(&OrientedRead<'a>) -> Option<T>,
) -> Option<(OrientedRead<'a>, T)> {
    for strand in [Strand::Forward, Strand::Reverse] {
        let oriented = read.oriented(strand);
        if let Some(hit) = search(&oriented) {
            return Some((oriented, hit));
        }
    }
    None
}

// Split Myers hits into runs of consecutive end positions.
fn hit_runs(hits: &[(usize, u8)]) -> Vec<&[(usize, u8)]> {
    let mut runs = Vec::new();
    let mut run_start = 0;
    for i in 1..=hits.len() {
        if i == hits.len() || hits[i].0 != hits[i - 1].0 + 1 {
            if run_start < i {
                runs.push(&hits[run_start..i]);
            }
            run_start = i;
        }
    }
    runs
}

fn bases_match(pattern: u8, text: u8) -> bool {
    pattern == text || text == TEXT_WILDCARD
}

/// Match `pattern` against a prefix of `text` with at most `max_edits` edits.
/// Returns the length of the text prefix consumed and the edit distance. Among
/// equally good prefixes the one closest to the pattern length wins.
fn anchored_match(pattern: &[u8], text: &[u8], max_edits: u8) -> Option<(usize, u8)> {
    let k = usize::from(max_edits);
    let m = pattern.len();
    let width = (m + k).min(text.len());

    // prev[j]: edit distance between the current pattern prefix and text[..j]
    let mut prev: Vec<usize> = (0..=width).collect();
    let mut cur = vec![0; width + 1];
    for i in 1..=m {
        cur[0] = i;
        for j in 1..=width {
            let diag = prev[j - 1] + usize::from(!bases_match(pattern[i - 1], text[j - 1]));
            cur[j] = diag.min(prev[j] + 1).min(cur[j - 1] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    (0..=width)
        .filter(|&j| prev[j] <= k)
        .min_by_key(|&j| (prev[j], j.abs_diff(m)))
        .map(|j| (j, prev[j] as u8))
}
