use std::fmt;

/// Typed errors for transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnError {
    /// Every participant slot group is claimed; no snapshot can be pinned
    RegistryFull,
}

impl fmt::Display for TxnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnError::RegistryFull => {
                write!(
                    f,
                    "participant registry is full ({} groups)",
                    zincir::MAX_PARTICIPANTS
                )
            }
        }
    }
}

impl std::error::Error for TxnError {}
