use crate::domain::pledge::{NewPledge, Pledge};
use crate::domain::ports::PledgeStore;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family holding pledges keyed by big-endian id.
pub const CF_PLEDGES: &str = "pledges";
/// Column Family for bookkeeping such as the id sequence.
pub const CF_META: &str = "meta";

const LAST_PLEDGE_ID: &[u8] = b"last_pledge_id";

/// A persistent pledge store using RocksDB.
///
/// Ids keep increasing across restarts. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBPledgeStore {
    db: Arc<DB>,
    sequence: Arc<Mutex<()>>,
}

impl RocksDBPledgeStore {
    /// Opens or creates a RocksDB instance at `path` with the required column families.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_pledges = ColumnFamilyDescriptor::new(CF_PLEDGES, Options::default());
        let cf_meta = ColumnFamilyDescriptor::new(CF_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_pledges, cf_meta])?;

        Ok(Self {
            db: Arc::new(db),
            sequence: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> StoreResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("{name} column family not found")))
    }

    fn last_id(&self) -> StoreResult<u64> {
        let meta = self.cf(CF_META)?;
        match self.db.get_cf(meta, LAST_PLEDGE_ID)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::Backend("corrupt pledge sequence".into()))?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl PledgeStore for RocksDBPledgeStore {
    async fn create(&self, pledge: NewPledge) -> StoreResult<Pledge> {
        let _guard = self.sequence.lock().await;
        let id = self.last_id()? + 1;
        let stored = Pledge::from_new(id, pledge, Utc::now());

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_META)?, LAST_PLEDGE_ID, id.to_be_bytes());
        batch.put_cf(self.cf(CF_PLEDGES)?, id.to_be_bytes(), serde_json::to_vec(&stored)?);
        self.db.write(batch)?;

        Ok(stored)
    }

    async fn update(&self, pledge: &Pledge) -> StoreResult<()> {
        let cf = self.cf(CF_PLEDGES)?;
        let key = pledge.id.to_be_bytes();
        if self.db.get_pinned_cf(cf, key)?.is_none() {
            return Err(StoreError::NotFound(format!("pledge {}", pledge.id)));
        }
        self.db.put_cf(cf, key, serde_json::to_vec(pledge)?)?;
        Ok(())
    }

    async fn get(&self, pledge_id: u64) -> StoreResult<Option<Pledge>> {
        let cf = self.cf(CF_PLEDGES)?;
        match self.db.get_cf(cf, pledge_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}
