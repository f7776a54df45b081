//! Account persistence contract and in-memory reference implementation
//!
//! `AccountRepository` is the only way the service reaches accounts.
//! `find_one_for_customer` is the single enforcement point for ownership
//! isolation: a lookup scoped to one customer never returns another
//! customer's account.

use crate::account::{Account, AccountNumber, AccountType, CustomerNumber};
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};

/// Capability interface for account persistence
pub trait AccountRepository: Send + Sync {
    /// All accounts owned by a customer, ordered by account number
    ///
    /// Empty for an unknown customer, never an error.
    fn find_all_by_customer(&self, customer: CustomerNumber) -> Result<Vec<Account>>;

    /// The account, if and only if it exists and is owned by `customer`
    fn find_one_for_customer(
        &self,
        customer: CustomerNumber,
        number: AccountNumber,
    ) -> Result<Account>;

    /// Bare lookup by account number, with no ownership check
    ///
    /// Only valid for transfer destinations under
    /// [`TransferPolicy::CrossOwner`](crate::config::TransferPolicy); every
    /// other access goes through [`find_one_for_customer`](Self::find_one_for_customer).
    fn find_by_number(&self, number: AccountNumber) -> Result<Account>;

    /// Persist the account's mutable fields
    ///
    /// Reports `AccountNotFound` when the target no longer exists, and
    /// refuses an owner change.
    fn save(&self, account: &Account) -> Result<()>;

    /// Persist several accounts, in the order given
    ///
    /// The default is sequential saves; durable backends override this with
    /// a single atomic write so a transfer's two legs commit together.
    fn save_all(&self, accounts: &[&Account]) -> Result<()> {
        for account in accounts {
            self.save(account)?;
        }
        Ok(())
    }

    /// Allocate a fresh account number and persist the new account
    ///
    /// Allocation never races: concurrent calls never share a number.
    fn create(
        &self,
        customer: CustomerNumber,
        account_type: AccountType,
        initial_minor: i64,
    ) -> Result<AccountNumber>;
}

/// In-memory repository (reference implementation)
///
/// Two derived views are kept mutually consistent: account number to
/// account, and customer number to the set of owned account numbers.
#[derive(Debug)]
pub struct MemoryRepository {
    by_number: DashMap<AccountNumber, Account>,
    by_customer: DashMap<CustomerNumber, BTreeSet<AccountNumber>>,
    next_number: AtomicU32,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Default first account number handed out by [`create`](AccountRepository::create)
    pub const DEFAULT_STARTING_NUMBER: u32 = 1000;

    /// Create an empty repository
    pub fn new() -> Self {
        Self::with_starting_number(Self::DEFAULT_STARTING_NUMBER)
    }

    /// Create an empty repository with a custom allocation start
    pub fn with_starting_number(starting_number: u32) -> Self {
        Self {
            by_number: DashMap::new(),
            by_customer: DashMap::new(),
            next_number: AtomicU32::new(starting_number),
        }
    }

    /// Insert a pre-built account (dev/test seeding)
    ///
    /// Keeps the allocator ahead of seeded numbers so `create` never reuses
    /// one.
    pub fn seed(&self, account: Account) {
        self.next_number
            .fetch_max(account.number().get() + 1, Ordering::SeqCst);
        self.by_customer
            .entry(account.customer())
            .or_default()
            .insert(account.number());
        self.by_number.insert(account.number(), account);
    }
}

impl AccountRepository for MemoryRepository {
    fn find_all_by_customer(&self, customer: CustomerNumber) -> Result<Vec<Account>> {
        let numbers = match self.by_customer.get(&customer) {
            Some(numbers) => numbers,
            None => return Ok(Vec::new()),
        };

        let mut accounts = Vec::with_capacity(numbers.len());
        for number in numbers.iter() {
            if let Some(account) = self.by_number.get(number) {
                accounts.push(account.clone());
            }
        }
        Ok(accounts)
    }

    fn find_one_for_customer(
        &self,
        customer: CustomerNumber,
        number: AccountNumber,
    ) -> Result<Account> {
        match self.by_number.get(&number) {
            Some(account) if account.customer() == customer => Ok(account.clone()),
            _ => Err(Error::AccountNotFound(format!(
                "account {} for customer {}",
                number, customer
            ))),
        }
    }

    fn find_by_number(&self, number: AccountNumber) -> Result<Account> {
        self.by_number
            .get(&number)
            .map(|account| account.clone())
            .ok_or_else(|| Error::AccountNotFound(format!("account {}", number)))
    }

    fn save(&self, account: &Account) -> Result<()> {
        let mut stored = self.by_number.get_mut(&account.number()).ok_or_else(|| {
            Error::AccountNotFound(format!("account {} no longer exists", account.number()))
        })?;

        // accounts are never reassigned to a different owner
        if stored.customer() != account.customer() {
            return Err(Error::Persistence(format!(
                "account {} cannot change owner",
                account.number()
            )));
        }

        *stored = account.clone();
        Ok(())
    }

    fn create(
        &self,
        customer: CustomerNumber,
        account_type: AccountType,
        initial_minor: i64,
    ) -> Result<AccountNumber> {
        let number = AccountNumber::new(self.next_number.fetch_add(1, Ordering::SeqCst));
        let account = Account::new(customer, number, account_type, initial_minor);

        self.by_number.insert(number, account);
        self.by_customer.entry(customer).or_default().insert(number);

        Ok(number)
    }
}
