//! Property-based tests for teller invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Deposits add exactly the requested amount
//! - Withdrawals never drive a balance negative
//! - Transfers conserve the total across both accounts
//! - Owner-scoped lookups never cross customers

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use teller_core::{
    Account, AccountNumber, AccountRepository, AccountService, AccountType, CustomerNumber, Error,
    MemoryRepository, Result,
};

const ALICE: CustomerNumber = CustomerNumber::new(952141);
const BOB: CustomerNumber = CustomerNumber::new(989947);

const CHECKING: AccountNumber = AccountNumber::new(1001);
const SAVINGS: AccountNumber = AccountNumber::new(1002);

/// Service over a repository seeded with one checking account for Alice
fn service_with_balance(balance_minor: i64) -> (AccountService, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    repo.seed(Account::new(ALICE, CHECKING, AccountType::Checking, balance_minor));
    (AccountService::new(repo.clone()), repo)
}

/// Service over a repository seeded with a checking/savings pair for Alice
fn service_with_pair(
    checking_minor: i64,
    savings_minor: i64,
) -> (AccountService, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    repo.seed(Account::new(ALICE, CHECKING, AccountType::Checking, checking_minor));
    repo.seed(Account::new(ALICE, SAVINGS, AccountType::Savings, savings_minor));
    (AccountService::new(repo.clone()), repo)
}

fn stored_balance(repo: &MemoryRepository, customer: CustomerNumber, number: AccountNumber) -> i64 {
    repo.find_one_for_customer(customer, number)
        .unwrap()
        .balance_minor()
}

/// Major-unit amount for a minor-unit count (exact for the tested ranges)
fn major(minor: i64) -> f64 {
    minor as f64 / 100.0
}

/// Strategy for seed balances in minor units
fn balance_strategy() -> impl Strategy<Value = i64> {
    0i64..1_000_000_00
}

/// Strategy for positive amounts in minor units
fn amount_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_00
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: a deposit of `amt` increases the balance by exactly `amt`
    #[test]
    fn prop_deposit_adds_exactly(balance in balance_strategy(), amount in amount_strategy()) {
        let (service, repo) = service_with_balance(balance);

        let new_balance = service.deposit(ALICE, CHECKING, major(amount)).unwrap();

        prop_assert_eq!(new_balance, Decimal::new(balance + amount, 2));
        prop_assert_eq!(stored_balance(&repo, ALICE, CHECKING), balance + amount);
    }

    /// Property: withdrawing more than the balance fails and changes nothing
    #[test]
    fn prop_overdraw_fails_and_preserves_balance(
        balance in balance_strategy(),
        excess in amount_strategy(),
    ) {
        let (service, repo) = service_with_balance(balance);

        let result = service.withdraw(ALICE, CHECKING, major(balance + excess));

        prop_assert!(matches!(result, Err(Error::InsufficientFunds(_))));
        prop_assert_eq!(stored_balance(&repo, ALICE, CHECKING), balance);
    }

    /// Property: an in-balance withdrawal subtracts exactly `amt`
    #[test]
    fn prop_withdraw_subtracts_exactly(
        (balance, amount) in (1i64..1_000_000_00).prop_flat_map(|b| (Just(b), 1..=b)),
    ) {
        let (service, repo) = service_with_balance(balance);

        let new_balance = service.withdraw(ALICE, CHECKING, major(amount)).unwrap();

        prop_assert_eq!(new_balance, Decimal::new(balance - amount, 2));
        prop_assert_eq!(stored_balance(&repo, ALICE, CHECKING), balance - amount);
    }

    /// Property: a transfer moves exactly `amt` and conserves the pair total
    #[test]
    fn prop_transfer_conserves_total(
        (from_balance, amount) in (1i64..1_000_000_00).prop_flat_map(|b| (Just(b), 1..=b)),
        to_balance in balance_strategy(),
    ) {
        let (service, repo) = service_with_pair(from_balance, to_balance);

        let receipt = service.transfer(ALICE, CHECKING, SAVINGS, major(amount)).unwrap();

        prop_assert_eq!(receipt.from_balance, Decimal::new(from_balance - amount, 2));
        prop_assert_eq!(receipt.to_balance, Decimal::new(to_balance + amount, 2));

        let from_stored = stored_balance(&repo, ALICE, CHECKING);
        let to_stored = stored_balance(&repo, ALICE, SAVINGS);
        prop_assert_eq!(from_stored + to_stored, from_balance + to_balance);
    }

    /// Property: an uncovered transfer fails and changes neither account
    #[test]
    fn prop_uncovered_transfer_changes_nothing(
        from_balance in balance_strategy(),
        to_balance in balance_strategy(),
        excess in amount_strategy(),
    ) {
        let (service, repo) = service_with_pair(from_balance, to_balance);

        let result = service.transfer(ALICE, CHECKING, SAVINGS, major(from_balance + excess));

        prop_assert!(matches!(result, Err(Error::InsufficientFunds(_))));
        prop_assert_eq!(stored_balance(&repo, ALICE, CHECKING), from_balance);
        prop_assert_eq!(stored_balance(&repo, ALICE, SAVINGS), to_balance);
    }

    /// Property: owner-scoped lookups never return another customer's account
    #[test]
    fn prop_ownership_isolation(owner in 1u32..100_000, intruder in 1u32..100_000) {
        prop_assume!(owner != intruder);

        let repo = MemoryRepository::new();
        let number = repo
            .create(CustomerNumber::new(owner), AccountType::Checking, 10_000)
            .unwrap();

        let result = repo.find_one_for_customer(CustomerNumber::new(intruder), number);
        prop_assert!(matches!(result, Err(Error::AccountNotFound(_))));

        let found = repo.find_one_for_customer(CustomerNumber::new(owner), number);
        prop_assert!(found.is_ok());
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use teller_core::{spawn_teller, Config, Metrics, RocksRepository, TransferPolicy};

    /// Repository wrapper that counts persistence calls
    #[derive(Debug)]
    struct CountingRepository {
        inner: MemoryRepository,
        saves: AtomicUsize,
    }

    impl CountingRepository {
        fn new(inner: MemoryRepository) -> Self {
            Self {
                inner,
                saves: AtomicUsize::new(0),
            }
        }

        fn save_count(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }
    }

    impl AccountRepository for CountingRepository {
        fn find_all_by_customer(&self, customer: CustomerNumber) -> Result<Vec<Account>> {
            self.inner.find_all_by_customer(customer)
        }

        fn find_one_for_customer(
            &self,
            customer: CustomerNumber,
            number: AccountNumber,
        ) -> Result<Account> {
            self.inner.find_one_for_customer(customer, number)
        }

        fn find_by_number(&self, number: AccountNumber) -> Result<Account> {
            self.inner.find_by_number(number)
        }

        fn save(&self, account: &Account) -> Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(account)
        }

        fn create(
            &self,
            customer: CustomerNumber,
            account_type: AccountType,
            initial_minor: i64,
        ) -> Result<AccountNumber> {
            self.inner.create(customer, account_type, initial_minor)
        }
    }

    #[test]
    fn scenario_a_deposit_into_seeded_account() {
        let (service, _repo) = service_with_balance(50_000);

        let balance = service.deposit(ALICE, CHECKING, 50.0).unwrap();
        assert_eq!(balance, Decimal::new(55_000, 2));
    }

    #[test]
    fn scenario_b_failed_withdrawal_never_touches_persistence() {
        let repo = {
            let inner = MemoryRepository::new();
            inner.seed(Account::new(ALICE, CHECKING, AccountType::Checking, 50_000));
            Arc::new(CountingRepository::new(inner))
        };
        let service = AccountService::new(repo.clone());

        let result = service.withdraw(ALICE, CHECKING, 600.0);

        assert!(matches!(result, Err(Error::InsufficientFunds(_))));
        assert_eq!(repo.save_count(), 0);
        assert_eq!(
            repo.find_one_for_customer(ALICE, CHECKING).unwrap().balance_minor(),
            50_000
        );
    }

    #[test]
    fn scenario_c_savings_to_checking_transfer() {
        let repo = Arc::new(MemoryRepository::new());
        repo.seed(Account::new(ALICE, SAVINGS, AccountType::Savings, 120_000));
        repo.seed(Account::new(ALICE, CHECKING, AccountType::Checking, 50_000));
        let service = AccountService::new(repo);

        let receipt = service.transfer(ALICE, SAVINGS, CHECKING, 200.0).unwrap();

        assert_eq!(receipt.from_balance, Decimal::new(100_000, 2));
        assert_eq!(receipt.to_balance, Decimal::new(70_000, 2));
    }

    #[test]
    fn scenario_d_same_account_transfer_rejected() {
        let (service, repo) = service_with_balance(50_000);

        for amount in [0.01, 100.0, 1_000_000.0] {
            let result = service.transfer(ALICE, CHECKING, CHECKING, amount);
            assert!(matches!(result, Err(Error::Validation(_))));
        }
        assert_eq!(stored_balance(&repo, ALICE, CHECKING), 50_000);
    }

    #[test]
    fn scenario_e_open_account_with_zero_balance() {
        let repo = Arc::new(MemoryRepository::new());
        let service = AccountService::new(repo.clone());

        let number = service.open_account(BOB, AccountType::Checking, 0.0).unwrap();

        let account = repo.find_one_for_customer(BOB, number).unwrap();
        assert_eq!(account.balance_minor(), 0);
        assert_eq!(account.account_type(), AccountType::Checking);
    }

    #[tokio::test]
    async fn test_racing_transfers_conserve_total() {
        let repo = Arc::new(MemoryRepository::new());
        repo.seed(Account::new(ALICE, CHECKING, AccountType::Checking, 100_000));
        repo.seed(Account::new(ALICE, SAVINGS, AccountType::Savings, 100_000));
        let handle = spawn_teller(AccountService::new(repo.clone()), 256, Metrics::default());

        let mut tasks = Vec::new();
        for i in 0..50u32 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                let (from, to) = if i % 2 == 0 {
                    (CHECKING, SAVINGS)
                } else {
                    (SAVINGS, CHECKING)
                };
                // rejections are fine; only conservation matters
                let _ = handle.transfer(ALICE, from, to, 70.0).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let total = stored_balance(&repo, ALICE, CHECKING) + stored_balance(&repo, ALICE, SAVINGS);
        assert_eq!(total, 200_000);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_account_opening_allocates_unique_numbers() {
        let repo = Arc::new(MemoryRepository::new());
        let handle = spawn_teller(AccountService::new(repo), 256, Metrics::default());

        let mut tasks = Vec::new();
        for i in 0..40u32 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle
                    .open_account(CustomerNumber::new(i % 4), AccountType::Savings, 1.0)
                    .await
                    .unwrap()
                    .get()
            }));
        }

        let mut numbers = Vec::new();
        for task in tasks {
            numbers.push(task.await.unwrap());
        }
        numbers.sort_unstable();
        numbers.dedup();
        assert_eq!(numbers.len(), 40);

        handle.shutdown().await.unwrap();
    }

    #[test]
    fn test_full_session_against_durable_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let (checking, savings) = {
            let repo = Arc::new(RocksRepository::open(&config).unwrap());
            let service = AccountService::new(repo);

            let checking = service.open_account(ALICE, AccountType::Checking, 500.0).unwrap();
            let savings = service.open_account(ALICE, AccountType::Savings, 1200.0).unwrap();

            service.deposit(ALICE, checking, 50.0).unwrap();
            let receipt = service.transfer(ALICE, savings, checking, 200.0).unwrap();
            assert_eq!(receipt.from_balance, Decimal::new(100_000, 2));
            assert_eq!(receipt.to_balance, Decimal::new(75_000, 2));

            (checking, savings)
        };

        // balances survive a reopen
        let repo = Arc::new(RocksRepository::open(&config).unwrap());
        let service = AccountService::new(repo);
        let accounts = service.accounts(ALICE).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].number(), checking);
        assert_eq!(accounts[0].balance_minor(), 75_000);
        assert_eq!(accounts[1].number(), savings);
        assert_eq!(accounts[1].balance_minor(), 100_000);
    }

    #[test]
    fn test_cross_owner_transfer_policy_end_to_end() {
        let repo = Arc::new(MemoryRepository::new());
        repo.seed(Account::new(ALICE, CHECKING, AccountType::Checking, 50_000));
        repo.seed(Account::new(BOB, AccountNumber::new(2001), AccountType::Checking, 25_000));

        let service = AccountService::new(repo.clone()).with_policy(TransferPolicy::CrossOwner);
        let receipt = service
            .transfer(ALICE, CHECKING, AccountNumber::new(2001), 150.0)
            .unwrap();

        assert_eq!(receipt.from_balance, Decimal::new(35_000, 2));
        assert_eq!(receipt.to_balance, Decimal::new(40_000, 2));
        assert_eq!(stored_balance(&repo, BOB, AccountNumber::new(2001)), 40_000);
    }
}
