//! Session state: the open database and command execution.

use serde::Serialize;
use starling::{
    PurchaseReceipt, SatisfactionRecord, Starling, StickerView, StoreId, StoreInfo, ThresholdTable,
    UserId, UserInfo,
};
use starling::EngineMetrics;

/// A command to run against the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Purchase { user: UserId, store: StoreId, count: u32 },
    Progress { user: UserId, store: StoreId },
    List { user: UserId },
    Sticker { user: UserId, store: StoreId },
    Stickers { user: UserId },
    UserAdd { username: String },
    UserGet { user: String },
    StoreAdd { name: String, location: String, id: Option<StoreId> },
    StoreGet { store: StoreId },
    Stores,
    Thresholds,
    Info,
    Flush,
}

/// One raw record in a listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressRow {
    pub store_id: StoreId,
    #[serde(flatten)]
    pub record: SatisfactionRecord,
}

/// Database summary for `info`.
#[derive(Debug, Clone, Serialize)]
pub struct InfoView {
    pub path: String,
    pub durability: String,
    pub ephemeral: bool,
    pub wal_entries_replayed: u64,
    pub levels_reconciled: u64,
    pub metrics: EngineMetrics,
}

/// Result of a command.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Output {
    Receipts(Vec<PurchaseReceipt>),
    Record(SatisfactionRecord),
    Records(Vec<ProgressRow>),
    Sticker(StickerView),
    Stickers(Vec<StickerView>),
    User(UserInfo),
    Store(StoreInfo),
    Stores(Vec<StoreInfo>),
    Thresholds(ThresholdTable),
    Info(InfoView),
    Ok,
}

/// The open database for the lifetime of the process.
pub struct SessionState {
    db: Starling,
}

impl SessionState {
    pub fn new(db: Starling) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Starling {
        &self.db
    }

    pub fn execute(&mut self, cmd: Command) -> starling::Result<Output> {
        let db = &self.db;
        Ok(match cmd {
            Command::Purchase { user, store, count } => {
                let mut receipts = Vec::new();
                for _ in 0..count {
                    receipts.push(db.stickers.record_purchase(user.clone(), store.clone())?);
                }
                Output::Receipts(receipts)
            }
            Command::Progress { user, store } => Output::Record(db.stickers.get_progress(user, store)?),
            Command::List { user } => Output::Records(
                db.stickers
                    .list_progress(user)?
                    .into_iter()
                    .map(|(store_id, record)| ProgressRow { store_id, record })
                    .collect(),
            ),
            Command::Sticker { user, store } => Output::Sticker(db.stickers.sticker(user, store)?),
            Command::Stickers { user } => Output::Stickers(db.stickers.stickers(user)?),
            Command::UserAdd { username } => Output::User(db.registry.register_user(&username)?),
            Command::UserGet { user } => match db.registry.user_by_name(&user) {
                Some(info) => Output::User(info),
                None => Output::User(db.registry.user(user)?),
            },
            Command::StoreAdd { name, location, id } => Output::Store(match id {
                Some(id) => db.registry.put_store(id, &name, &location)?,
                None => db.registry.register_store(&name, &location)?,
            }),
            Command::StoreGet { store } => Output::Store(db.registry.store(store)?),
            Command::Stores => Output::Stores(db.registry.stores()),
            Command::Thresholds => Output::Thresholds(db.thresholds().clone()),
            Command::Info => {
                let report = db.recovery_report();
                Output::Info(InfoView {
                    path: db.path().display().to_string(),
                    durability: db.durability_mode().description().to_string(),
                    ephemeral: db.is_ephemeral(),
                    wal_entries_replayed: report.wal.entries_replayed,
                    levels_reconciled: report.levels_reconciled,
                    metrics: db.metrics(),
                })
            }
            Command::Flush => {
                db.flush()?;
                Output::Ok
            }
        })
    }
}
