//! Read-side lookups for the service layer

use std::sync::Arc;

use crate::errors::{ReceiptError, Result};
use crate::model::{Page, PageRequest, ReceiptDetail, ReceiptFilter, UploadBatch};
use crate::store::ReceiptStore;

pub struct ReceiptQueries<S: ReceiptStore + ?Sized> {
    store: Arc<S>,
}

impl<S: ReceiptStore + ?Sized> Clone for ReceiptQueries<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ReceiptStore + ?Sized> ReceiptQueries<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// `NotFound` for an unknown receipt number.
    pub fn receipt_detail(&self, receipt_number: &str) -> Result<ReceiptDetail> {
        let receipt = self.store.find_receipt(receipt_number)?.ok_or_else(|| {
            ReceiptError::ReceiptNotFound {
                receipt_number: receipt_number.to_string(),
            }
        })?;
        let current_version = match &receipt.current_version_id {
            Some(id) => self.store.get_version(id)?,
            None => None,
        };
        Ok(ReceiptDetail {
            receipt,
            current_version,
        })
    }

    pub fn search_receipts(
        &self,
        filter: &ReceiptFilter,
        page: PageRequest,
    ) -> Result<Page<ReceiptDetail>> {
        self.store.search_receipts(filter, page)
    }

    pub fn list_batches(&self, page: PageRequest) -> Result<Page<UploadBatch>> {
        self.store.list_batches(page)
    }

    /// # Errors
    ///
    /// `NotFound` for an unknown batch id.
    pub fn get_batch(&self, batch_id: &str) -> Result<UploadBatch> {
        self.store.get_batch(batch_id)?.ok_or_else(|| {
            ReceiptError::BatchNotFound {
                batch_id: batch_id.to_string(),
            }
            .into()
        })
    }
}
