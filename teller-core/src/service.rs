//! Account service: validated, owner-aware mutation of accounts
//!
//! The service is the only entry point that mutates accounts. Each operation
//! validates its input, loads the freshest state through the repository's
//! owner-scoped lookup, applies the domain change on [`Account`], and
//! persists before returning. Transfers are two-phase with an in-memory
//! compensation path; nothing is persisted unless both legs succeeded.

use crate::account::{Account, AccountNumber, AccountType, CustomerNumber};
use crate::config::TransferPolicy;
use crate::error::{Error, Result};
use crate::money;
use crate::repository::AccountRepository;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// Both new balances after a successful transfer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferReceipt {
    /// New source balance
    pub from_balance: Decimal,
    /// New destination balance
    pub to_balance: Decimal,
}

/// Business-logic boundary for account operations
pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    policy: TransferPolicy,
}

impl AccountService {
    /// Create a service over a repository with the default (intra-owner)
    /// transfer policy
    pub fn new(repository: Arc<dyn AccountRepository>) -> Self {
        Self {
            repository,
            policy: TransferPolicy::default(),
        }
    }

    /// Set the transfer destination policy
    pub fn with_policy(mut self, policy: TransferPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Deposit money into an account, returning the new balance
    ///
    /// Never fails for a valid amount and an existing account.
    pub fn deposit(
        &self,
        customer: CustomerNumber,
        number: AccountNumber,
        amount: f64,
    ) -> Result<Decimal> {
        let minor = money::require_positive(amount)?;

        let mut account = self.repository.find_one_for_customer(customer, number)?;
        if !account.deposit(minor) {
            return Err(Error::Validation(format!(
                "deposit would overflow account {}",
                number
            )));
        }

        self.repository.save(&account)?;
        Ok(account.balance())
    }

    /// Withdraw money from an account, returning the new balance
    ///
    /// On insufficient funds nothing is persisted and the balance is
    /// unchanged.
    pub fn withdraw(
        &self,
        customer: CustomerNumber,
        number: AccountNumber,
        amount: f64,
    ) -> Result<Decimal> {
        let minor = money::require_positive(amount)?;

        let mut account = self.repository.find_one_for_customer(customer, number)?;
        if !account.withdraw(minor) {
            return Err(Error::InsufficientFunds(format!(
                "account {} cannot cover a withdrawal of {}",
                number,
                money::to_decimal(minor)
            )));
        }

        self.repository.save(&account)?;
        Ok(account.balance())
    }

    /// Transfer money between two accounts
    ///
    /// Two-phase: the source debit aborts on insufficient funds with no
    /// state change; a destination credit failure triggers a compensating
    /// credit back into the in-memory source before the error propagates.
    /// Both accounts are persisted only after both legs succeeded, source
    /// first.
    pub fn transfer(
        &self,
        customer: CustomerNumber,
        from: AccountNumber,
        to: AccountNumber,
        amount: f64,
    ) -> Result<TransferReceipt> {
        let minor = money::require_positive(amount)?;
        if from == to {
            return Err(Error::Validation(
                "cannot transfer to the same account".to_string(),
            ));
        }

        let mut source = self.repository.find_one_for_customer(customer, from)?;
        let mut destination = match self.policy {
            TransferPolicy::IntraOwner => self.repository.find_one_for_customer(customer, to)?,
            TransferPolicy::CrossOwner => self.repository.find_by_number(to)?,
        };

        if !source.withdraw(minor) {
            return Err(Error::InsufficientFunds(format!(
                "account {} cannot cover a transfer of {}",
                from,
                money::to_decimal(minor)
            )));
        }

        if !destination.deposit(minor) {
            // compensating credit; the in-memory pair stays balance-conserving
            source.deposit(minor);
            return Err(Error::Validation(format!(
                "destination account {} rejected the deposit",
                to
            )));
        }

        self.repository.save_all(&[&source, &destination])?;

        Ok(TransferReceipt {
            from_balance: source.balance(),
            to_balance: destination.balance(),
        })
    }

    /// Open a new account, returning the allocated account number
    ///
    /// The initial deposit must be finite and non-negative; it is rounded to
    /// the nearest minor unit. Allocation is delegated to the repository.
    pub fn open_account(
        &self,
        customer: CustomerNumber,
        account_type: AccountType,
        initial_deposit: f64,
    ) -> Result<AccountNumber> {
        let initial_minor = money::require_non_negative(initial_deposit)?;
        self.repository.create(customer, account_type, initial_minor)
    }

    /// All accounts owned by a customer, ordered by account number
    pub fn accounts(&self, customer: CustomerNumber) -> Result<Vec<Account>> {
        self.repository.find_all_by_customer(customer)
    }
}

impl fmt::Debug for AccountService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
