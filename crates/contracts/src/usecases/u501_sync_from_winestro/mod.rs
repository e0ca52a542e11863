pub mod progress;
pub mod request;
pub mod response;
pub mod webhook;

pub use progress::{SyncPhase, SyncProgress};
pub use request::{SyncAction, SyncOptions, SyncRequest, SyncTrigger};
pub use response::{
    ConnectionTestResult, ItemOutcome, SingleProductSyncResult, SyncResponse, SyncResult,
};
pub use webhook::{WebhookEvent, WebhookPayload, WebhookResponse};

use crate::usecases::common::UseCaseMetadata;

pub struct SyncFromWinestro;

impl UseCaseMetadata for SyncFromWinestro {
    fn usecase_index() -> &'static str {
        "u501"
    }

    fn usecase_name() -> &'static str {
        "sync_from_winestro"
    }

    fn display_name() -> &'static str {
        "Синхронизация каталога из Winestro"
    }
}
