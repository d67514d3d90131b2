//! What a recurring schedule produces when it fires.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Payload type of a schedule. Scheduling is identical for all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    /// Ledger transaction (income or expense)
    Transaction,
    /// Customer invoice
    Invoice,
    /// Vendor bill
    Bill,
}

impl ScheduleKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 3] = [Self::Transaction, Self::Invoice, Self::Bill];

    /// Storage name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Invoice => "invoice",
            Self::Bill => "bill",
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::validation(format!("Unknown schedule kind: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!("bill".parse::<ScheduleKind>().unwrap(), ScheduleKind::Bill);
        assert_eq!("Invoice".parse::<ScheduleKind>().unwrap(), ScheduleKind::Invoice);
        assert!(matches!(
            "payroll".parse::<ScheduleKind>().unwrap_err(),
            Error::Validation { .. }
        ));
    }
}
