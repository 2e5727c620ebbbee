mod model;

pub use model::{
    FileDraft, FileRecord, FileSummary, MediaType, Operation, OperationKind, ProcessedResult,
    ResultDraft,
};
