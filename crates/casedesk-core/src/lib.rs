pub mod case;
pub mod config;
pub mod doc_type;
pub mod document;
pub mod listing;
pub mod session;
pub mod upload;

pub use case::{Case, CaseProgress, CaseStatus, DocumentRequirement, RequirementStatus, UserRef};
pub use config::PollConfig;
pub use doc_type::{MatchKind, classify, exact_match, normalize_type};
pub use document::{DocumentStatusReport, ExtractedData};
pub use listing::{ListQuery, Page, SortKey, SortOrder, StatusFilter};
pub use session::Session;
pub use upload::{AllowedFileType, FileTypeError, UploadRequest};
