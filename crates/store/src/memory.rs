use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use docgenius_core::{
    FileDraft, FileRecord, FileSummary, OperationKind, ProcessedResult, ResultDraft,
};

#[derive(Clone, Default)]
pub struct MemStorage {
    inner: Arc<Mutex<StoreInner>>,
}

struct StoreInner {
    files: BTreeMap<i64, FileRecord>,
    results: BTreeMap<i64, ProcessedResult>,
    next_file_id: i64,
    next_result_id: i64,
}

impl Default for StoreInner {
    fn default() -> Self {
        Self {
            files: BTreeMap::new(),
            results: BTreeMap::new(),
            next_file_id: 1,
            next_result_id: 1,
        }
    }
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_file(&self, draft: FileDraft) -> FileRecord {
        let mut inner = self.inner.lock();
        let id = inner.next_file_id;
        inner.next_file_id += 1;
        let record = FileRecord {
            id,
            filename: draft.filename,
            original_name: draft.original_name,
            file_type: draft.file_type,
            file_size: draft.file_size,
            content: draft.content,
            uploaded_at: Utc::now(),
        };
        inner.files.insert(id, record.clone());
        record
    }

    pub fn get_file(&self, id: i64) -> Option<FileRecord> {
        self.inner.lock().files.get(&id).cloned()
    }

    pub fn recent_files(&self, limit: usize) -> Vec<FileSummary> {
        let inner = self.inner.lock();
        let mut files: Vec<&FileRecord> = inner.files.values().collect();
        // Stable sort: identical timestamps keep insertion order.
        files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        files
            .into_iter()
            .take(limit)
            .map(|file| file.summary())
            .collect()
    }

    pub fn create_result(&self, draft: ResultDraft) -> ProcessedResult {
        self.inner.lock().insert_result(draft)
    }

    pub fn results_for_file(&self, file_id: i64) -> Vec<ProcessedResult> {
        let inner = self.inner.lock();
        let mut results: Vec<ProcessedResult> = inner
            .results
            .values()
            .filter(|result| result.file_id == file_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results
    }

    pub fn find_result(
        &self,
        file_id: i64,
        kind: OperationKind,
        question: Option<&str>,
    ) -> Option<ProcessedResult> {
        self.inner
            .lock()
            .find_result(file_id, kind, question)
            .cloned()
    }

    // Check-and-insert under one lock acquisition: at most one record per
    // (file_id, kind, question) key ever lands in the map.
    pub fn insert_result_if_absent(&self, draft: ResultDraft) -> (ProcessedResult, bool) {
        let mut inner = self.inner.lock();
        if let Some(existing) =
            inner.find_result(draft.file_id, draft.kind, draft.question.as_deref())
        {
            return (existing.clone(), false);
        }
        (inner.insert_result(draft), true)
    }
}

impl StoreInner {
    fn insert_result(&mut self, draft: ResultDraft) -> ProcessedResult {
        let id = self.next_result_id;
        self.next_result_id += 1;
        let record = ProcessedResult {
            id,
            file_id: draft.file_id,
            kind: draft.kind,
            question: draft.question,
            result: draft.result,
            created_at: Utc::now(),
        };
        self.results.insert(id, record.clone());
        record
    }

    fn find_result(
        &self,
        file_id: i64,
        kind: OperationKind,
        question: Option<&str>,
    ) -> Option<&ProcessedResult> {
        self.results.values().find(|result| {
            result.file_id == file_id
                && result.kind == kind
                && (kind != OperationKind::Qa || result.question.as_deref() == question)
        })
    }
}
