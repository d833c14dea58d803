// Copyright (c) 2018 10x Genomics, Inc. All rights reserved.

//! Nucleotide sequence helpers and strand handling.

use std::borrow::Cow;

pub use bio::alphabets::dna::{complement, revcomp};

/// Return the reversed byte string. Used for quality strings that have to
/// follow a reverse-complemented sequence.
pub fn reverse(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().rev().copied().collect()
}

/// Upper-case a sequence, borrowing when it is already upper case.
pub fn to_upper(seq: &[u8]) -> Cow<'_, [u8]> {
    if seq.iter().any(u8::is_ascii_lowercase) {
        Cow::Owned(seq.to_ascii_uppercase())
    } else {
        Cow::Borrowed(seq)
    }
}

/// Which strand of a read a match was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn is_forward(self) -> bool {
        self == Strand::Forward
    }

    /// Orient a sequence and its quality string onto this strand. The quality is
    /// reversed in lockstep with the sequence.
    pub fn orient<'a>(self, seq: &'a [u8], qual: &'a [u8]) -> (Cow<'a, [u8]>, Cow<'a, [u8]>) {
        match self {
            Strand::Forward => (Cow::Borrowed(seq), Cow::Borrowed(qual)),
            Strand::Reverse => (Cow::Owned(revcomp(seq)), Cow::Owned(reverse(qual))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::{prop_assert_eq, proptest};

    #[test]
    fn test_revcomp() {
        assert_eq!(revcomp(b"AACGTN"), b"NACGTT");
        assert_eq!(revcomp(b"acgT"), b"Acgt");
        assert_eq!(revcomp(b""), b"");
        assert_eq!(
            revcomp(b"AGATGTGTATAAGAGACAG"),
            b"CTGTCTCTTATACACATCT".to_vec()
        );
    }

    #[test]
    fn test_orient() {
        let (s, q) = Strand::Forward.orient(b"AACG", b"!#%&");
        assert!(matches!(s, Cow::Borrowed(_)));
        assert_eq!(&*q, b"!#%&");

        let (s, q) = Strand::Reverse.orient(b"AACG", b"!#%&");
        assert_eq!(&*s, b"CGTT");
        assert_eq!(&*q, b"&%#!");
    }

    #[test]
    fn test_to_upper() {
        assert!(matches!(to_upper(b"ACGT"), Cow::Borrowed(_)));
        assert_eq!(&*to_upper(b"acGt"), b"ACGT");
    }

    proptest! {
        #[test]
        fn prop_test_revcomp_involution(seq in "[ACGTN]{0,50}") {
            let seq = seq.into_bytes();
            prop_assert_eq!(revcomp(&revcomp(&seq)), seq);
        }
    }
}
