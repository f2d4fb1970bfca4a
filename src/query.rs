//! Read-only access to question records.
//!
//! Every call re-reads the store file, so pollers always see the latest
//! saved snapshot. The service keeps its `RecordStore` private and exposes
//! no way to change a record.

use crate::errors::StoreError;
use crate::store::{QuestionRecord, QuestionStatus, RecordStore};

/// Number of records in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub generating: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn from_records(records: &[QuestionRecord]) -> Self {
        let mut counts = Self::default();
        for record in records {
            match record.status {
                QuestionStatus::Pending => counts.pending += 1,
                QuestionStatus::Generating => counts.generating += 1,
                QuestionStatus::Completed => counts.completed += 1,
                QuestionStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pending + self.generating + self.completed + self.failed
    }
}

#[derive(Debug, Clone)]
pub struct QueryService {
    store: RecordStore,
}

impl QueryService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// All records, newest first.
    pub fn get_all(&self) -> Result<Vec<QuestionRecord>, StoreError> {
        let mut records = self.store.load()?.records;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<QuestionRecord>, StoreError> {
        Ok(self.store.load()?.get(id).cloned())
    }

    /// First record submitted with `term`.
    pub fn get_by_term(&self, term: &str) -> Result<Option<QuestionRecord>, StoreError> {
        Ok(self.store.load()?.find_by_term(term).cloned())
    }

    /// Records in `status`, in stored order.
    pub fn get_by_status(&self, status: QuestionStatus) -> Result<Vec<QuestionRecord>, StoreError> {
        Ok(self
            .store
            .load()?
            .records
            .into_iter()
            .filter(|r| r.status == status)
            .collect())
    }

    /// Look up by id first, then by term.
    pub fn find(&self, id_or_term: &str) -> Result<Option<QuestionRecord>, StoreError> {
        let store = self.store.load()?;
        Ok(store
            .get(id_or_term)
            .or_else(|| store.find_by_term(id_or_term))
            .cloned())
    }

    pub fn stats(&self) -> Result<StatusCounts, StoreError> {
        Ok(StatusCounts::from_records(&self.store.load()?.records))
    }
}
