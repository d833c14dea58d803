use thiserror::Error;

/// Why a read with a recognised adapter is still not a usable fragment.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("found {0} transposase signatures, expected two")]
    SignatureCount(usize),
    #[error("single transposase signature, runoff fragments are not kept")]
    RunoffNotKept,
    #[error("barcode at {barcode} does not precede the transposase signature ending at {signature_end}")]
    BarcodeAfterSignature { barcode: usize, signature_end: usize },
    #[error("insert of {len} bases is shorter than the minimum of {min}")]
    InsertTooShort { len: usize, min: usize },
    #[error("fragment of {len} bases is shorter than the minimum of {min}")]
    FragmentTooShort { len: usize, min: usize },
}

/// Result of placing one assay's technical sequences on a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateOutcome<T> {
    Located(T),
    /// The adapter was not found on either strand.
    NoAnchor,
    InvalidGeometry(GeometryError),
}

impl<T> LocateOutcome<T> {
    pub fn is_located(&self) -> bool {
        matches!(self, LocateOutcome::Located(_))
    }

    pub fn located(self) -> Option<T> {
        match self {
            LocateOutcome::Located(loc) => Some(loc),
            LocateOutcome::NoAnchor | LocateOutcome::InvalidGeometry(_) => None,
        }
    }
}

impl<T> From<Result<T, GeometryError>> for LocateOutcome<T> {
    fn from(result: Result<T, GeometryError>) -> Self {
        match result {
            Ok(loc) => LocateOutcome::Located(loc),
            Err(reason) => LocateOutcome::InvalidGeometry(reason),
        }
    }
}
