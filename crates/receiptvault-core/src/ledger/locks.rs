use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Exclusive in-process locks keyed by receipt number
///
/// Held from reading a receipt's current version until its write commits,
/// so two writers on one receipt can never both compute the same next
/// version number. Receipts with different numbers never wait on each
/// other. Idle entries are dropped on release.
#[derive(Debug, Default)]
pub struct ReceiptLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ReceiptLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `receipt_number`
    pub fn with_lock<T>(&self, receipt_number: &str, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(
                slots
                    .entry(receipt_number.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let result = {
            let _guard = slot.lock();
            f()
        };

        let mut slots = self.slots.lock();
        // map + this call are the only holders: nobody is waiting
        if Arc::strong_count(&slot) == 2 {
            slots.remove(receipt_number);
        }
        result
    }

    /// Receipt numbers with a live lock slot
    pub fn active_keys(&self) -> usize {
        self.slots.lock().len()
    }
}
