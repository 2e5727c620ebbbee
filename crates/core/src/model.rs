use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MediaType {
    #[serde(rename = "application/pdf")]
    Pdf,
    #[serde(rename = "application/vnd.ms-powerpoint")]
    Ppt,
    #[serde(
        rename = "application/vnd.openxmlformats-officedocument.presentationml.presentation"
    )]
    Pptx,
    #[serde(rename = "application/msword")]
    Doc,
    #[serde(rename = "application/vnd.openxmlformats-officedocument.wordprocessingml.document")]
    Docx,
    #[serde(rename = "text/plain")]
    Text,
}

impl MediaType {
    pub fn from_mime(value: &str) -> Option<Self> {
        match value {
            "application/pdf" => Some(MediaType::Pdf),
            "application/vnd.ms-powerpoint" => Some(MediaType::Ppt),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Some(MediaType::Pptx)
            }
            "application/msword" => Some(MediaType::Doc),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(MediaType::Docx)
            }
            "text/plain" => Some(MediaType::Text),
            _ => None,
        }
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Ppt => "application/vnd.ms-powerpoint",
            MediaType::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            MediaType::Doc => "application/msword",
            MediaType::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            MediaType::Text => "text/plain",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Summary,
    Qa,
    Math,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Summary => "summary",
            OperationKind::Qa => "qa",
            OperationKind::Math => "math",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "summary" => Some(OperationKind::Summary),
            "qa" => Some(OperationKind::Qa),
            "math" => Some(OperationKind::Math),
            _ => None,
        }
    }

    pub fn capitalized(&self) -> &'static str {
        match self {
            OperationKind::Summary => "Summary",
            OperationKind::Qa => "Qa",
            OperationKind::Math => "Math",
        }
    }

    pub fn fallback_text(&self) -> &'static str {
        match self {
            OperationKind::Summary => "Unable to generate summary",
            OperationKind::Qa => "Unable to generate answer",
            OperationKind::Math => "Unable to solve mathematical problems",
        }
    }

    pub fn failure_text(&self) -> &'static str {
        match self {
            OperationKind::Summary => "Failed to generate summary. Please try again.",
            OperationKind::Qa => "Failed to generate answer. Please try again.",
            OperationKind::Math => "Failed to solve mathematical problems. Please try again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Summary,
    Qa { question: String },
    Math,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Summary => OperationKind::Summary,
            Operation::Qa { .. } => OperationKind::Qa,
            Operation::Math => OperationKind::Math,
        }
    }

    pub fn question(&self) -> Option<&str> {
        match self {
            Operation::Qa { question } => Some(question),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub file_type: MediaType,
    pub file_size: u64,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn summary(&self) -> FileSummary {
        FileSummary {
            id: self.id,
            original_name: self.original_name.clone(),
            file_type: self.file_type,
            file_size: self.file_size,
            uploaded_at: self.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub id: i64,
    pub original_name: String,
    pub file_type: MediaType,
    pub file_size: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FileDraft {
    pub filename: String,
    pub original_name: String,
    pub file_type: MediaType,
    pub file_size: u64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResult {
    pub id: i64,
    pub file_id: i64,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub question: Option<String>,
    pub result: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ResultDraft {
    pub file_id: i64,
    pub kind: OperationKind,
    pub question: Option<String>,
    pub result: String,
}
