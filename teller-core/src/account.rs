//! Core account types
//!
//! The `Account` entity holds a balance in integer minor units and enforces
//! the non-negative invariant at the smallest granularity: `withdraw` is
//! self-guarding, so the entity can never be driven below zero. Amount
//! validation (sign, NaN, infinity) belongs to the service layer.

use crate::money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Customer identifier (opaque owner id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerNumber(u32);

impl CustomerNumber {
    /// Create new customer number
    pub const fn new(n: u32) -> Self {
        Self(n)
    }

    /// Get as raw number
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CustomerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account identifier, allocated by the repository and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountNumber(u32);

impl AccountNumber {
    /// Create new account number
    pub const fn new(n: u32) -> Self {
        Self(n)
    }

    /// Get as raw number
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account product type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AccountType {
    /// Checking account
    Checking,
    /// Savings account
    Savings,
}

impl AccountType {
    /// Canonical code, as persisted
    pub fn code(&self) -> &'static str {
        match self {
            AccountType::Checking => "CHECKING",
            AccountType::Savings => "SAVINGS",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CHECKING" => Some(AccountType::Checking),
            "SAVINGS" => Some(AccountType::Savings),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Balance-bearing account entity
///
/// The balance is a count of minor currency units (cents); conversion to a
/// decimal form happens only at the service boundary via [`Account::balance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    customer: CustomerNumber,
    number: AccountNumber,
    account_type: AccountType,
    balance_minor: i64,
    opened_at: DateTime<Utc>,
}

impl Account {
    /// Create an account with an initial balance in minor units
    ///
    /// Called by repositories on creation/seeding; the initial balance must
    /// already be validated as non-negative.
    pub fn new(
        customer: CustomerNumber,
        number: AccountNumber,
        account_type: AccountType,
        initial_minor: i64,
    ) -> Self {
        debug_assert!(initial_minor >= 0);
        Self {
            customer,
            number,
            account_type,
            balance_minor: initial_minor,
            opened_at: Utc::now(),
        }
    }

    /// Owning customer
    pub fn customer(&self) -> CustomerNumber {
        self.customer
    }

    /// Account number
    pub fn number(&self) -> AccountNumber {
        self.number
    }

    /// Product type
    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    /// Balance in minor units
    pub fn balance_minor(&self) -> i64 {
        self.balance_minor
    }

    /// Balance as a boundary decimal (e.g. `550.00`)
    pub fn balance(&self) -> Decimal {
        money::to_decimal(self.balance_minor)
    }

    /// Creation timestamp
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Credit the account with `amount_minor` units
    ///
    /// Returns `false` without mutating when the credit cannot be applied
    /// (balance would overflow). Sign validation is the caller's job.
    pub fn deposit(&mut self, amount_minor: i64) -> bool {
        match self.balance_minor.checked_add(amount_minor) {
            Some(next) => {
                self.balance_minor = next;
                true
            }
            None => false,
        }
    }

    /// Debit the account by `amount_minor` units
    ///
    /// Check-then-mutate is a single step from the caller's perspective:
    /// on insufficient funds nothing changes and `false` is returned.
    pub fn withdraw(&mut self, amount_minor: i64) -> bool {
        if self.balance_minor < amount_minor {
            return false;
        }
        self.balance_minor -= amount_minor;
        true
    }
}
