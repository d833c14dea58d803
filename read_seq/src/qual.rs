// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Phred+33 quality strings.

/// ASCII offset of the quality encoding.
pub const PHRED_OFFSET: u8 = 33;

/// Phred score of one quality character. Characters below the offset score zero.
pub fn phred(c: u8) -> u8 {
    c.saturating_sub(PHRED_OFFSET)
}

/// Phred scores of a whole quality string.
pub fn phred_scores(qual: &[u8]) -> impl Iterator<Item = u8> + '_ {
    qual.iter().map(|&c| phred(c))
}
