//! Data models exchanged with the document API.

mod analytics;
mod category;
mod document;
mod session;
pub mod timestamp;

pub use analytics::{AiInsights, ChartData, ChartSeries};
pub use category::{CategoryAssignment, ManualCategory, MlApplyResult};
pub use document::{DateFilter, Document, DocumentFilter, UploadResponse};
pub use session::{Identity, NewSession, Session, SessionId};
