//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store`
//! trait. Compound mutations take a per-user lock stripe for the whole
//! read-check-write-log sequence and commit through one `WriteBatch`.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use lootvault_core::ledger::{keys as ledger_keys, reasons};
use lootvault_core::{
    Balance, BucketDelta, CoreError, CreditTransaction, EntryId, LedgerEntry, UserId, WithdrawalId,
    WithdrawalRequest, WithdrawalStatus,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::locks::LockStripes;
use crate::schema::{all_column_families, cf};
use crate::{AggregateTotals, Applied, PurchaseCredit, SettledSession, Store, WithdrawalDebit};

/// `RocksDB`-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    locks: LockStripes,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            locks: LockStripes::new(),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Raw balance read, no locking.
    fn load_balance(&self, user_id: &UserId) -> Result<Option<Balance>> {
        let cf = self.cf(cf::BALANCES)?;
        self.db
            .get_cf(&cf, keys::balance_key(user_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Resolve an idempotency key to its committed entry, if any.
    fn entry_for_key(&self, idempotency_key: &str) -> Result<Option<LedgerEntry>> {
        let cf = self.cf(cf::IDEMPOTENCY_KEYS)?;
        let Some(raw) = self
            .db
            .get_cf(&cf, keys::idempotency_key(idempotency_key))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut bytes = [0u8; 16];
        if raw.len() != 16 {
            return Err(StoreError::Database(format!(
                "malformed idempotency record for key {idempotency_key}"
            )));
        }
        bytes.copy_from_slice(&raw);
        let entry_id =
            EntryId::from_bytes(bytes).map_err(|e| StoreError::Database(e.to_string()))?;

        self.get_entry(&entry_id)?.map_or_else(
            || {
                Err(StoreError::Database(format!(
                    "ledger entry missing for idempotency key {idempotency_key}"
                )))
            },
            |entry| Ok(Some(entry)),
        )
    }

    /// Commit a mutated balance together with its audit entry, the user
    /// index row, and the idempotency mapping, in one write batch.
    fn commit_entry(&self, balance: &Balance, entry: &LedgerEntry) -> Result<()> {
        let cf_balances = self.cf(cf::BALANCES)?;
        let cf_entries = self.cf(cf::LEDGER_ENTRIES)?;
        let cf_by_user = self.cf(cf::ENTRIES_BY_USER)?;
        let cf_idem = self.cf(cf::IDEMPOTENCY_KEYS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_balances,
            keys::balance_key(&balance.user_id),
            Self::serialize(balance)?,
        );
        batch.put_cf(
            &cf_entries,
            keys::entry_key(&entry.id),
            Self::serialize(entry)?,
        );
        batch.put_cf(
            &cf_by_user,
            keys::user_entry_key(&entry.user_id, &entry.id),
            [],
        );
        if let Some(key) = &entry.idempotency_key {
            batch.put_cf(&cf_idem, keys::idempotency_key(key), entry.id.to_bytes());
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Map a bucket-level rejection to `InsufficientFunds`.
    fn insufficient(
        balance: &Balance,
        delta: &BucketDelta,
        bucket: lootvault_core::Bucket,
    ) -> StoreError {
        StoreError::InsufficientFunds {
            bucket: bucket.as_str(),
            balance: balance.credits.bucket(bucket),
            requested: delta.bucket(bucket).abs(),
        }
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Balances
    // =========================================================================

    fn get_balance(&self, user_id: &UserId) -> Result<Option<Balance>> {
        self.load_balance(user_id)
    }

    fn ensure_balance(&self, user_id: &UserId) -> Result<Balance> {
        let _guard = self.locks.guard_user(user_id);

        if let Some(balance) = self.load_balance(user_id)? {
            return Ok(balance);
        }

        let balance = Balance::new(*user_id);
        let cf = self.cf(cf::BALANCES)?;
        self.db
            .put_cf(&cf, keys::balance_key(user_id), Self::serialize(&balance)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(user_id = %user_id, "Created zero balance row");
        Ok(balance)
    }

    // =========================================================================
    // Idempotent Ledger
    // =========================================================================

    fn apply(
        &self,
        user_id: &UserId,
        delta: BucketDelta,
        reason: &str,
        idempotency_key: Option<&str>,
    ) -> Result<Applied> {
        let _guard = self.locks.guard_user(user_id);

        if let Some(key) = idempotency_key {
            if let Some(entry) = self.entry_for_key(key)? {
                return Ok(Applied {
                    balance: entry.balance_after,
                    entry,
                    replayed: true,
                });
            }
        }

        let mut balance = self
            .load_balance(user_id)?
            .unwrap_or_else(|| Balance::new(*user_id));

        let next = balance
            .credits
            .checked_apply(&delta)
            .map_err(|bucket| Self::insufficient(&balance, &delta, bucket))?;

        balance.credits = next;
        if delta.winnings > 0 {
            balance.lifetime_won += delta.winnings;
        }
        balance.updated_at = Utc::now();

        let entry = LedgerEntry::new(
            *user_id,
            delta,
            next,
            reason,
            idempotency_key.map(str::to_string),
        );
        self.commit_entry(&balance, &entry)?;

        Ok(Applied {
            balance: next,
            entry,
            replayed: false,
        })
    }

    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>> {
        let cf = self.cf(cf::LEDGER_ENTRIES)?;
        self.db
            .get_cf(&cf, keys::entry_key(entry_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_entry_by_key(&self, idempotency_key: &str) -> Result<Option<LedgerEntry>> {
        self.entry_for_key(idempotency_key)
    }

    fn list_entries_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>> {
        let cf_by_user = self.cf(cf::ENTRIES_BY_USER)?;
        let prefix = keys::user_entries_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // ULIDs sort oldest-first within the prefix; collect then reverse
        // for newest-first listing.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        let mut entries = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if entries.len() >= limit {
                break;
            }
            let entry_id = keys::extract_entry_id_from_user_key(&key);
            if let Some(entry) = self.get_entry(&entry_id)? {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    fn credit_purchase(
        &self,
        user_id: &UserId,
        credits: i64,
        bonus_credits: i64,
        idempotency_key: &str,
    ) -> Result<PurchaseCredit> {
        if credits <= 0 {
            return Err(StoreError::InvalidAmount { amount: credits });
        }

        let _guard = self.locks.guard_user(user_id);

        if let Some(entry) = self.entry_for_key(idempotency_key)? {
            let bonus_granted = entry.delta.purchased - credits;
            return Ok(PurchaseCredit {
                applied: Applied {
                    balance: entry.balance_after,
                    entry,
                    replayed: true,
                },
                bonus_granted,
            });
        }

        let mut balance = self
            .load_balance(user_id)?
            .unwrap_or_else(|| Balance::new(*user_id));

        // The bonus decision reads the same balance the credit mutates,
        // inside the same lock: concurrent first purchases cannot both
        // observe an unclaimed zero balance.
        let bonus_granted = if bonus_credits > 0 && balance.welcome_bonus_eligible() {
            bonus_credits
        } else {
            0
        };

        let delta = BucketDelta::purchased(credits + bonus_granted);
        let next = balance
            .credits
            .checked_apply(&delta)
            .map_err(|bucket| Self::insufficient(&balance, &delta, bucket))?;

        balance.credits = next;
        balance.lifetime_purchased += credits;
        if bonus_granted > 0 {
            balance.welcome_bonus_claimed = true;
        }
        balance.updated_at = Utc::now();

        let entry = LedgerEntry::new(
            *user_id,
            delta,
            next,
            reasons::CREDIT_PURCHASE,
            Some(idempotency_key.to_string()),
        );
        self.commit_entry(&balance, &entry)?;

        Ok(PurchaseCredit {
            applied: Applied {
                balance: next,
                entry,
                replayed: false,
            },
            bonus_granted,
        })
    }

    fn insert_credit_transaction(&self, transaction: &CreditTransaction) -> Result<()> {
        let key = keys::credit_transaction_key(&transaction.tx_hash);
        let _guard = self.locks.guard_bytes(&key);

        let cf = self.cf(cf::CREDIT_TRANSACTIONS)?;
        let exists = self
            .db
            .get_cf(&cf, &key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        if exists {
            return Err(StoreError::DuplicateTransaction {
                tx_hash: transaction.tx_hash.clone(),
            });
        }

        self.db
            .put_cf(&cf, key, Self::serialize(transaction)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_credit_transaction(&self, tx_hash: &str) -> Result<Option<CreditTransaction>> {
        let cf = self.cf(cf::CREDIT_TRANSACTIONS)?;
        self.db
            .get_cf(&cf, keys::credit_transaction_key(tx_hash))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    // =========================================================================
    // Withdrawals
    // =========================================================================

    fn decrement_withdrawable(
        &self,
        user_id: &UserId,
        credits: i64,
        withdrawal_id: &WithdrawalId,
    ) -> Result<WithdrawalDebit> {
        if credits <= 0 {
            return Err(StoreError::InvalidAmount { amount: credits });
        }

        let _guard = self.locks.guard_user(user_id);

        let idempotency_key = ledger_keys::withdrawal(withdrawal_id);
        if let Some(entry) = self.entry_for_key(&idempotency_key)? {
            return Ok(WithdrawalDebit {
                winnings_part: -entry.delta.winnings,
                purchased_part: -entry.delta.purchased,
                applied: Applied {
                    balance: entry.balance_after,
                    entry,
                    replayed: true,
                },
            });
        }

        let mut balance = self
            .load_balance(user_id)?
            .unwrap_or_else(|| Balance::new(*user_id));

        let withdrawable = balance.withdrawable();
        if credits > withdrawable {
            return Err(StoreError::InsufficientWithdrawable {
                withdrawable,
                requested: credits,
            });
        }

        // Consumption order: winnings first, purchased for the remainder,
        // bonus never.
        let winnings_part = balance.credits.winnings.min(credits);
        let purchased_part = credits - winnings_part;
        let delta = BucketDelta {
            purchased: -purchased_part,
            winnings: -winnings_part,
            bonus: 0,
        };

        let next = balance
            .credits
            .checked_apply(&delta)
            .map_err(|bucket| Self::insufficient(&balance, &delta, bucket))?;

        balance.credits = next;
        balance.lifetime_withdrawn += credits;
        balance.updated_at = Utc::now();

        let entry = LedgerEntry::new(
            *user_id,
            delta,
            next,
            reasons::withdrawal(withdrawal_id),
            Some(idempotency_key),
        );
        self.commit_entry(&balance, &entry)?;

        Ok(WithdrawalDebit {
            winnings_part,
            purchased_part,
            applied: Applied {
                balance: next,
                entry,
                replayed: false,
            },
        })
    }

    fn put_withdrawal(&self, request: &WithdrawalRequest) -> Result<()> {
        let cf_withdrawals = self.cf(cf::WITHDRAWALS)?;
        let cf_by_user = self.cf(cf::WITHDRAWALS_BY_USER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_withdrawals,
            keys::withdrawal_key(&request.id),
            Self::serialize(request)?,
        );
        batch.put_cf(
            &cf_by_user,
            keys::user_withdrawal_key(&request.user_id, &request.created_at, &request.id),
            [],
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_withdrawal(&self, withdrawal_id: &WithdrawalId) -> Result<Option<WithdrawalRequest>> {
        let cf = self.cf(cf::WITHDRAWALS)?;
        self.db
            .get_cf(&cf, keys::withdrawal_key(withdrawal_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_withdrawals_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<WithdrawalRequest>> {
        let cf_by_user = self.cf(cf::WITHDRAWALS_BY_USER)?;
        let prefix = keys::user_withdrawals_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        let mut requests = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if requests.len() >= limit {
                break;
            }
            let withdrawal_id = keys::extract_withdrawal_id_from_user_key(&key);
            if let Some(request) = self.get_withdrawal(&withdrawal_id)? {
                requests.push(request);
            }
        }

        Ok(requests)
    }

    fn update_withdrawal_status(
        &self,
        withdrawal_id: &WithdrawalId,
        to: WithdrawalStatus,
        proof_of_payment: Option<String>,
    ) -> Result<WithdrawalRequest> {
        let key = keys::withdrawal_key(withdrawal_id);
        let _guard = self.locks.guard_bytes(&key);

        let mut request = self
            .get_withdrawal(withdrawal_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "withdrawal",
                id: withdrawal_id.to_string(),
            })?;

        request.transition_to(to).map_err(|err| match err {
            CoreError::InvalidTransition { from, to } => StoreError::InvalidTransition { from, to },
            other => StoreError::Database(other.to_string()),
        })?;

        if let Some(proof) = proof_of_payment {
            request.proof_of_payment = Some(proof);
        }

        let cf = self.cf(cf::WITHDRAWALS)?;
        self.db
            .put_cf(&cf, key, Self::serialize(&request)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(request)
    }

    // =========================================================================
    // Game sessions
    // =========================================================================

    fn mark_session_settled(&self, session_id: &str, game: &str) -> Result<()> {
        let key = keys::game_session_key(session_id);
        let _guard = self.locks.guard_bytes(&key);

        let cf = self.cf(cf::GAME_SESSIONS)?;
        let exists = self
            .db
            .get_cf(&cf, &key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .is_some();
        if exists {
            return Err(StoreError::SessionAlreadySettled {
                session_id: session_id.to_string(),
            });
        }

        let record = SettledSession {
            game: game.to_string(),
            settled_at: Utc::now(),
        };
        self.db
            .put_cf(&cf, key, Self::serialize(&record)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    fn bump_totals(&self, delta: &AggregateTotals) -> Result<()> {
        let key = keys::totals_key();
        let _guard = self.locks.guard_bytes(&key);

        let mut totals = self.get_totals()?;
        totals.purchase_count += delta.purchase_count;
        totals.credits_purchased += delta.credits_purchased;
        totals.bonus_granted += delta.bonus_granted;
        totals.credits_withdrawn += delta.credits_withdrawn;

        let cf = self.cf(cf::TOTALS)?;
        self.db
            .put_cf(&cf, key, Self::serialize(&totals)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_totals(&self) -> Result<AggregateTotals> {
        let cf = self.cf(cf::TOTALS)?;
        Ok(self
            .db
            .get_cf(&cf, keys::totals_key())
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()?
            .unwrap_or_default())
    }
}
