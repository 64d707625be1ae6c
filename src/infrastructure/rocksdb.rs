use crate::domain::account::Account;
use crate::domain::act::Act;
use crate::domain::payment::Payment;
use crate::domain::ports::{Changeset, SettlementStore};
use crate::domain::request::PaymentRequest;
use crate::domain::{AccountId, ActId, PaymentId, RequestId, Version};
use crate::error::{Result, SettlementError};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for payment requests.
pub const CF_REQUESTS: &str = "requests";
/// Column Family for account states.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for acts and their allocations.
pub const CF_ACTS: &str = "acts";
/// Column Family for the append-only payment records.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for id sequences.
pub const CF_META: &str = "meta";

const KEY_NEXT_REQUEST_ID: &[u8] = b"next_request_id";
const KEY_NEXT_PAYMENT_ID: &[u8] = b"next_payment_id";

/// A persistent settlement store backed by RocksDB.
///
/// Entities are JSON-encoded into one Column Family per table. Reads go
/// straight to the DB; `commit` serializes writers through a mutex, re-checks
/// every version guard, and applies the whole changeset as a single
/// `WriteBatch`. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_REQUESTS, CF_ACCOUNTS, CF_ACTS, CF_PAYMENTS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            SettlementError::Internal(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn get_json<T: DeserializeOwned>(&self, cf: &'static str, id: u32) -> Result<Option<T>> {
        let handle = self.cf(cf)?;
        match self.db.get_cf(handle, id.to_be_bytes())? {
            Some(bytes) => {
                let row = serde_json::from_slice(&bytes)
                    .map_err(|e| SettlementError::Internal(Box::new(e)))?;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    fn scan_json<T: DeserializeOwned>(&self, cf: &'static str) -> Result<Vec<T>> {
        let handle = self.cf(cf)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(handle, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let row = serde_json::from_slice(&value)
                .map_err(|e| SettlementError::Internal(Box::new(e)))?;
            rows.push(row);
        }
        Ok(rows)
    }

    fn put_json<T: Serialize>(&self, cf: &'static str, id: u32, row: &T) -> Result<()> {
        let handle = self.cf(cf)?;
        let value = serde_json::to_vec(row).map_err(|e| SettlementError::Internal(Box::new(e)))?;
        self.db.put_cf(handle, id.to_be_bytes(), value)?;
        Ok(())
    }

    fn batch_put_json<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf: &'static str,
        id: u32,
        row: &T,
    ) -> Result<()> {
        let handle = self.cf(cf)?;
        let value = serde_json::to_vec(row).map_err(|e| SettlementError::Internal(Box::new(e)))?;
        batch.put_cf(handle, id.to_be_bytes(), value);
        Ok(())
    }

    fn current_version<T: DeserializeOwned>(
        &self,
        cf: &'static str,
        id: u32,
        version: impl Fn(&T) -> Version,
    ) -> Result<Option<Version>> {
        Ok(self.get_json::<T>(cf, id)?.map(|row| version(&row)))
    }

    async fn next_id(&self, key: &'static [u8]) -> Result<u32> {
        let _guard = self.write_lock.lock().await;
        let handle = self.cf(CF_META)?;
        let next = match self.db.get_cf(handle, key)? {
            Some(bytes) => {
                let raw: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    SettlementError::Internal(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "corrupt id sequence",
                    )))
                })?;
                u32::from_be_bytes(raw)
            }
            None => 1,
        };
        self.db.put_cf(handle, key, (next + 1).to_be_bytes())?;
        Ok(next)
    }

    fn insert_new<T: Serialize + DeserializeOwned>(
        &self,
        cf: &'static str,
        entity: &'static str,
        id: u32,
        row: &T,
    ) -> Result<()> {
        if self.get_json::<T>(cf, id)?.is_some() {
            return Err(SettlementError::Validation(format!(
                "{entity} {id} already exists"
            )));
        }
        self.put_json(cf, id, row)
    }
}

#[async_trait]
impl SettlementStore for RocksDbStore {
    async fn request(&self, id: RequestId) -> Result<Option<PaymentRequest>> {
        self.get_json(CF_REQUESTS, id)
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>> {
        self.get_json(CF_ACCOUNTS, id)
    }

    async fn act(&self, id: ActId) -> Result<Option<Act>> {
        self.get_json(CF_ACTS, id)
    }

    async fn payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        self.get_json(CF_PAYMENTS, id)
    }

    async fn requests(&self) -> Result<Vec<PaymentRequest>> {
        self.scan_json(CF_REQUESTS)
    }

    async fn accounts(&self) -> Result<Vec<Account>> {
        self.scan_json(CF_ACCOUNTS)
    }

    async fn insert_request(&self, request: PaymentRequest) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.insert_new(CF_REQUESTS, "payment request", request.id, &request)
    }

    async fn insert_account(&self, account: Account) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.insert_new(CF_ACCOUNTS, "account", account.id, &account)
    }

    async fn insert_act(&self, act: Act) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.insert_new(CF_ACTS, "act", act.id, &act)
    }

    async fn next_request_id(&self) -> Result<RequestId> {
        self.next_id(KEY_NEXT_REQUEST_ID).await
    }

    async fn next_payment_id(&self) -> Result<PaymentId> {
        self.next_id(KEY_NEXT_PAYMENT_ID).await
    }

    async fn commit(&self, changeset: Changeset) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        for write in &changeset.requests {
            let current =
                self.current_version::<PaymentRequest>(CF_REQUESTS, write.row.id, |r| r.version)?;
            if current != Some(write.expected) {
                return Err(SettlementError::ConcurrentModification {
                    entity: "payment request",
                    id: write.row.id,
                });
            }
        }
        for write in &changeset.accounts {
            let current = self.current_version::<Account>(CF_ACCOUNTS, write.row.id, |a| a.version)?;
            if current != Some(write.expected) {
                return Err(SettlementError::ConcurrentModification {
                    entity: "account",
                    id: write.row.id,
                });
            }
        }
        for write in &changeset.acts {
            let current = self.current_version::<Act>(CF_ACTS, write.row.id, |a| a.version)?;
            if current != Some(write.expected) {
                return Err(SettlementError::ConcurrentModification {
                    entity: "act",
                    id: write.row.id,
                });
            }
        }
        for payment in &changeset.payments {
            if self.get_json::<Payment>(CF_PAYMENTS, payment.id)?.is_some() {
                return Err(SettlementError::ConcurrentModification {
                    entity: "payment",
                    id: payment.id,
                });
            }
        }

        let mut batch = WriteBatch::default();
        for write in &changeset.requests {
            self.batch_put_json(&mut batch, CF_REQUESTS, write.row.id, &write.row)?;
        }
        for write in &changeset.accounts {
            self.batch_put_json(&mut batch, CF_ACCOUNTS, write.row.id, &write.row)?;
        }
        for write in &changeset.acts {
            self.batch_put_json(&mut batch, CF_ACTS, write.row.id, &write.row)?;
        }
        for payment in &changeset.payments {
            self.batch_put_json(&mut batch, CF_PAYMENTS, payment.id, payment)?;
        }
        self.db.write(batch)?;
        Ok(())
    }
}
