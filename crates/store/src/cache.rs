use thiserror::Error;

use docgenius_core::{Operation, ProcessedResult, ResultDraft};
use docgenius_llm::{math_prompt, qa_prompt, summary_prompt, TextGenerator};

use crate::MemStorage;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("file {0} not found")]
    FileNotFound(i64),
    #[error("text generation failed: {0}")]
    Generation(#[from] anyhow::Error),
}

// Cache-aside: return the stored result for (file, kind, question) when one
// exists, otherwise generate, store, and return it. Concurrent misses may both
// pay for generation, but insert_result_if_absent keeps a single record.
pub async fn resolve_operation(
    store: &MemStorage,
    generator: &dyn TextGenerator,
    file_id: i64,
    operation: &Operation,
) -> Result<ProcessedResult, ResolveError> {
    let kind = operation.kind();
    if let Some(existing) = store.find_result(file_id, kind, operation.question()) {
        return Ok(existing);
    }
    let file = store
        .get_file(file_id)
        .ok_or(ResolveError::FileNotFound(file_id))?;
    let prompt = match operation {
        Operation::Summary => summary_prompt(&file.original_name, &file.content),
        Operation::Qa { question } => qa_prompt(&file.original_name, question, &file.content),
        Operation::Math => math_prompt(&file.original_name, &file.content),
    };
    let generated = generator.generate(&prompt).await?;
    let result = if generated.trim().is_empty() {
        kind.fallback_text().to_string()
    } else {
        generated
    };
    let (record, _) = store.insert_result_if_absent(ResultDraft {
        file_id,
        kind,
        question: operation.question().map(|q| q.to_string()),
        result,
    });
    Ok(record)
}
