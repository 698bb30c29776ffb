//! Domain model: operations, keys, results, batch ranges, increment decisions, errors.

pub mod category;
pub mod decision;
pub mod errors;
pub mod ids;
pub mod operation;
pub mod range;
pub mod results;

pub use category::ApiCategory;
pub use decision::{IncrementDecision, IncrementReason, decide};
pub use errors::{CallError, HookError, HookKind, SurgeError};
pub use ids::{OperationKey, RunId};
pub use operation::Operation;
pub use range::BatchRange;
pub use results::ResultStore;
