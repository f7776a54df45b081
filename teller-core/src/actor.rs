//! Actor-based concurrency for the teller
//!
//! A single-writer task owns the [`AccountService`]; every mutation flows
//! through its mailbox, so at most one mutating operation is in flight at a
//! time. Two concurrent withdrawals can never both read the same stale
//! balance, which is what keeps the non-negative invariant intact under
//! concurrent callers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │              Front-end sessions (external)            │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               TellerHandle (Clone)                    │
//! │         Sends messages to the actor mailbox           │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              TellerActor (Single Task)                │
//! │        AccountService → AccountRepository             │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::account::{Account, AccountNumber, AccountType, CustomerNumber};
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::service::{AccountService, TransferReceipt};
use rust_decimal::Decimal;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the teller actor
#[derive(Debug)]
pub enum TellerMessage {
    /// Deposit into an account
    Deposit {
        /// Requesting customer
        customer: CustomerNumber,
        /// Target account
        number: AccountNumber,
        /// Amount in major units
        amount: f64,
        /// Reply channel
        response: oneshot::Sender<Result<Decimal>>,
    },

    /// Withdraw from an account
    Withdraw {
        /// Requesting customer
        customer: CustomerNumber,
        /// Target account
        number: AccountNumber,
        /// Amount in major units
        amount: f64,
        /// Reply channel
        response: oneshot::Sender<Result<Decimal>>,
    },

    /// Transfer between two accounts
    Transfer {
        /// Requesting customer
        customer: CustomerNumber,
        /// Source account
        from: AccountNumber,
        /// Destination account
        to: AccountNumber,
        /// Amount in major units
        amount: f64,
        /// Reply channel
        response: oneshot::Sender<Result<TransferReceipt>>,
    },

    /// Open a new account
    OpenAccount {
        /// Owning customer
        customer: CustomerNumber,
        /// Product type
        account_type: AccountType,
        /// Initial deposit in major units
        initial_deposit: f64,
        /// Reply channel
        response: oneshot::Sender<Result<AccountNumber>>,
    },

    /// List a customer's accounts
    Accounts {
        /// Requesting customer
        customer: CustomerNumber,
        /// Reply channel
        response: oneshot::Sender<Result<Vec<Account>>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes teller messages
#[derive(Debug)]
pub struct TellerActor {
    service: AccountService,
    mailbox: mpsc::Receiver<TellerMessage>,
    metrics: Metrics,
}

impl TellerActor {
    /// Create new actor
    pub fn new(
        service: AccountService,
        mailbox: mpsc::Receiver<TellerMessage>,
        metrics: Metrics,
    ) -> Self {
        Self {
            service,
            mailbox,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if matches!(msg, TellerMessage::Shutdown) {
                break;
            }
            self.handle_message(msg);
        }
    }

    /// Handle a single message
    fn handle_message(&self, msg: TellerMessage) {
        let started = Instant::now();

        match msg {
            TellerMessage::Deposit {
                customer,
                number,
                amount,
                response,
            } => {
                let result = self.service.deposit(customer, number, amount);
                self.observe(result.is_ok(), result.as_ref().err(), |m| m.record_deposit());
                let _ = response.send(result);
            }

            TellerMessage::Withdraw {
                customer,
                number,
                amount,
                response,
            } => {
                let result = self.service.withdraw(customer, number, amount);
                self.observe(result.is_ok(), result.as_ref().err(), |m| {
                    m.record_withdrawal()
                });
                let _ = response.send(result);
            }

            TellerMessage::Transfer {
                customer,
                from,
                to,
                amount,
                response,
            } => {
                let result = self.service.transfer(customer, from, to, amount);
                self.observe(result.is_ok(), result.as_ref().err(), |m| {
                    m.record_transfer()
                });
                let _ = response.send(result);
            }

            TellerMessage::OpenAccount {
                customer,
                account_type,
                initial_deposit,
                response,
            } => {
                let result = self.service.open_account(customer, account_type, initial_deposit);
                self.observe(result.is_ok(), result.as_ref().err(), |m| {
                    m.record_account_opened()
                });
                let _ = response.send(result);
            }

            TellerMessage::Accounts { customer, response } => {
                let _ = response.send(self.service.accounts(customer));
            }

            TellerMessage::Shutdown => {
                // Handled in main loop
            }
        }

        self.metrics
            .record_op_duration(started.elapsed().as_secs_f64());
    }

    fn observe(&self, ok: bool, err: Option<&Error>, on_success: impl Fn(&Metrics)) {
        if ok {
            on_success(&self.metrics);
        } else if let Some(err) = err {
            if !err.is_retryable() {
                self.metrics.record_rejection();
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct TellerHandle {
    sender: mpsc::Sender<TellerMessage>,
}

impl TellerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<TellerMessage>) -> Self {
        Self { sender }
    }

    /// Deposit money into an account
    pub async fn deposit(
        &self,
        customer: CustomerNumber,
        number: AccountNumber,
        amount: f64,
    ) -> Result<Decimal> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(TellerMessage::Deposit {
                customer,
                number,
                amount,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Withdraw money from an account
    pub async fn withdraw(
        &self,
        customer: CustomerNumber,
        number: AccountNumber,
        amount: f64,
    ) -> Result<Decimal> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(TellerMessage::Withdraw {
                customer,
                number,
                amount,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Transfer money between two accounts
    pub async fn transfer(
        &self,
        customer: CustomerNumber,
        from: AccountNumber,
        to: AccountNumber,
        amount: f64,
    ) -> Result<TransferReceipt> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(TellerMessage::Transfer {
                customer,
                from,
                to,
                amount,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Open a new account
    pub async fn open_account(
        &self,
        customer: CustomerNumber,
        account_type: AccountType,
        initial_deposit: f64,
    ) -> Result<AccountNumber> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(TellerMessage::OpenAccount {
                customer,
                account_type,
                initial_deposit,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// List a customer's accounts, ordered by account number
    pub async fn accounts(&self, customer: CustomerNumber) -> Result<Vec<Account>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(TellerMessage::Accounts {
                customer,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(TellerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the teller actor
pub fn spawn_teller(
    service: AccountService,
    mailbox_capacity: usize,
    metrics: Metrics,
) -> TellerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = TellerActor::new(service, rx, metrics);

    tokio::spawn(async move {
        actor.run().await;
    });

    TellerHandle::new(tx)
}
