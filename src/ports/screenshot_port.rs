//! Screenshot file-storage port.

use crate::domain::error::JournalError;
use crate::domain::trade::{ScreenshotRef, ScreenshotSlot, TradeId};

pub trait ScreenshotStore {
    fn store(
        &self,
        user_id: &str,
        id: &TradeId,
        slot: ScreenshotSlot,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ScreenshotRef, JournalError>;

    fn delete(&self, reference: &ScreenshotRef) -> Result<(), JournalError>;
}
