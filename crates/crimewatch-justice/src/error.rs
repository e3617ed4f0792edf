//! Error types for the crimewatch-justice crate.
//!
//! Invalid state transitions are returned as typed errors rather than
//! boolean sentinels. Every operation validates before it mutates, so an
//! `Err` never leaves partial state behind. Unknown crime identifiers are
//! not errors at all: the catalog resolves them to its default kind.

use crimewatch_types::{ReportId, SubjectId};

/// Errors from the imprisonment state machine.
#[derive(Debug, thiserror::Error)]
pub enum IncarcerationError {
    /// The subject already has an active prisoner record.
    #[error("subject {0} is already imprisoned")]
    AlreadyImprisoned(SubjectId),

    /// No prison facility has been configured yet.
    #[error("no prison facility configured")]
    NoFacility,

    /// The subject has no active prisoner record.
    #[error("subject {0} is not imprisoned")]
    NotImprisoned(SubjectId),

    /// Not enough of the sentence has been served to post bail.
    #[error("bail for {subject} needs more than {required} ticks served, has {served}")]
    BailNotAvailable {
        /// The prisoner.
        subject: SubjectId,
        /// Ticks served so far.
        served: u64,
        /// Ticks that must be exceeded before bail opens.
        required: u64,
    },

    /// The sentence carries no bail option (e.g. debt imprisonment).
    #[error("no bail offered for subject {0}")]
    BailNotOffered(SubjectId),

    /// The subject's balance does not cover the bail amount.
    #[error("insufficient funds: bail is {required} but balance is {available}")]
    InsufficientFunds {
        /// Bail amount.
        required: u64,
        /// Balance reported by the ledger.
        available: u64,
    },

    /// The ledger collaborator refused the withdrawal.
    #[error("ledger withdrawal failed: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },
}

/// Errors from the bribery resolver.
#[derive(Debug, thiserror::Error)]
pub enum BriberyError {
    /// The report was already reported or bribed and cannot change.
    #[error("report {0} is closed")]
    ReportClosed(ReportId),

    /// The offer went to someone other than the report's witness.
    #[error("report {report} was not made by {witness}")]
    WrongWitness {
        /// The report the offer targeted.
        report: ReportId,
        /// The subject who received the offer.
        witness: SubjectId,
    },
}

/// Failure raised by a per-witness reaction hook.
///
/// The witness service logs these and moves on to the next witness.
#[derive(Debug, thiserror::Error)]
#[error("reaction hook failed: {reason}")]
pub struct ReactionError {
    /// Description supplied by the hook.
    pub reason: String,
}

/// Failure raised by the ledger collaborator.
#[derive(Debug, thiserror::Error)]
#[error("ledger error: {reason}")]
pub struct LedgerError {
    /// Description supplied by the ledger.
    pub reason: String,
}

/// Errors from structured persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The stored document could not be encoded or decoded.
    #[error("store JSON failed: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
