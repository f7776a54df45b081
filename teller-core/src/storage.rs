//! Durable account store backed by RocksDB
//!
//! # Column Families
//!
//! - `accounts` - account records (key: account number, big-endian)
//! - `owners` - owner index (key: customer number || account number)
//! - `meta` - allocator state (key: `next_account_number`)
//!
//! Records are bincode-encoded [`Account`] values with the balance as an
//! integer minor-unit count. Multi-account saves go through a single
//! `WriteBatch`, so both legs of a transfer become durable together.

use crate::account::{Account, AccountNumber, AccountType, CustomerNumber};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::repository::AccountRepository;
use parking_lot::Mutex;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, WriteBatch, DB};
use std::fmt;
use std::sync::Arc;

/// Column family names
const CF_ACCOUNTS: &str = "accounts";
const CF_OWNERS: &str = "owners";
const CF_META: &str = "meta";

/// Allocator key in the `meta` column family
const META_NEXT_NUMBER: &[u8] = b"next_account_number";

/// RocksDB-backed [`AccountRepository`]
pub struct RocksRepository {
    db: Arc<DB>,
    // serializes number allocation in `create`
    alloc: Mutex<()>,
    starting_number: u32,
}

impl RocksRepository {
    /// Open or create the database under `config.data_dir`
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Self::cf_options_accounts()),
            ColumnFamilyDescriptor::new(CF_OWNERS, Self::cf_options_owners()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened account store at {:?}", path);

        Ok(Self {
            db: Arc::new(db),
            alloc: Mutex::new(()),
            starting_number: config.starting_account_number,
        })
    }

    // Column family options

    fn cf_options_accounts() -> Options {
        let mut opts = Options::default();
        // accounts are read on every operation, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_owners() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // the owner index benefits from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Persistence(format!("Column family {} not found", name)))
    }

    // Key helpers

    fn account_key(number: AccountNumber) -> [u8; 4] {
        number.get().to_be_bytes()
    }

    fn owner_key(customer: CustomerNumber, number: AccountNumber) -> [u8; 8] {
        let mut key = [0u8; 8];
        key[..4].copy_from_slice(&customer.get().to_be_bytes());
        key[4..].copy_from_slice(&number.get().to_be_bytes());
        key
    }

    /// Load an account record, `None` if absent
    fn load(&self, number: AccountNumber) -> Result<Option<Account>> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let value = self.db.get_cf(cf, Self::account_key(number))?;

        match value {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Existence + ownership check shared by `save` and `save_all`
    fn check_saveable(&self, account: &Account) -> Result<()> {
        let stored = self.load(account.number())?.ok_or_else(|| {
            Error::AccountNotFound(format!("account {} no longer exists", account.number()))
        })?;

        // accounts are never reassigned to a different owner
        if stored.customer() != account.customer() {
            return Err(Error::Persistence(format!(
                "account {} cannot change owner",
                account.number()
            )));
        }

        Ok(())
    }

    fn next_account_number(&self) -> Result<u32> {
        let cf = self.cf_handle(CF_META)?;
        match self.db.get_cf(cf, META_NEXT_NUMBER)? {
            Some(bytes) => {
                let bytes: [u8; 4] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Persistence("corrupt allocator state".to_string()))?;
                Ok(u32::from_be_bytes(bytes))
            }
            None => Ok(self.starting_number),
        }
    }
}

impl fmt::Debug for RocksRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RocksRepository")
            .field("starting_number", &self.starting_number)
            .finish_non_exhaustive()
    }
}

impl AccountRepository for RocksRepository {
    fn find_all_by_customer(&self, customer: CustomerNumber) -> Result<Vec<Account>> {
        let cf_owners = self.cf_handle(CF_OWNERS)?;
        let prefix = customer.get().to_be_bytes();

        let iter = self.db.prefix_iterator_cf(cf_owners, prefix);

        let mut accounts = Vec::new();
        for item in iter {
            let (key, _) = item?;

            if key.len() < 8 || key[..4] != prefix {
                break;
            }

            let number_bytes: [u8; 4] = key[4..8]
                .try_into()
                .map_err(|_| Error::Persistence("corrupt owner index key".to_string()))?;
            let number = AccountNumber::new(u32::from_be_bytes(number_bytes));

            let account = self.load(number)?.ok_or_else(|| {
                Error::Persistence(format!("owner index references missing account {}", number))
            })?;
            accounts.push(account);
        }

        Ok(accounts)
    }

    fn find_one_for_customer(
        &self,
        customer: CustomerNumber,
        number: AccountNumber,
    ) -> Result<Account> {
        match self.load(number)? {
            Some(account) if account.customer() == customer => Ok(account),
            _ => Err(Error::AccountNotFound(format!(
                "account {} for customer {}",
                number, customer
            ))),
        }
    }

    fn find_by_number(&self, number: AccountNumber) -> Result<Account> {
        self.load(number)?
            .ok_or_else(|| Error::AccountNotFound(format!("account {}", number)))
    }

    fn save(&self, account: &Account) -> Result<()> {
        self.check_saveable(account)?;

        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let value = bincode::serialize(account)?;
        self.db.put_cf(cf, Self::account_key(account.number()), value)?;

        tracing::debug!(account = %account.number(), "Balance persisted");

        Ok(())
    }

    fn save_all(&self, accounts: &[&Account]) -> Result<()> {
        for account in accounts {
            self.check_saveable(account)?;
        }

        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let mut batch = WriteBatch::default();
        for account in accounts {
            let value = bincode::serialize(account)?;
            batch.put_cf(cf, Self::account_key(account.number()), value);
        }

        // single atomic commit for all legs
        self.db.write(batch)?;

        tracing::debug!(count = accounts.len(), "Balances persisted atomically");

        Ok(())
    }

    fn create(
        &self,
        customer: CustomerNumber,
        account_type: AccountType,
        initial_minor: i64,
    ) -> Result<AccountNumber> {
        let _guard = self.alloc.lock();

        let raw = self.next_account_number()?;
        let number = AccountNumber::new(raw);
        let account = Account::new(customer, number, account_type, initial_minor);

        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        let cf_owners = self.cf_handle(CF_OWNERS)?;
        let cf_meta = self.cf_handle(CF_META)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_accounts, Self::account_key(number), bincode::serialize(&account)?);
        batch.put_cf(cf_owners, Self::owner_key(customer, number), []);
        batch.put_cf(cf_meta, META_NEXT_NUMBER, (raw + 1).to_be_bytes());
        self.db.write(batch)?;

        tracing::debug!(
            customer = %customer,
            account = %number,
            account_type = %account_type,
            "Account created"
        );

        Ok(number)
    }
}
