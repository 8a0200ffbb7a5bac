// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Keel.
//!
//! Pure request-level values: the URI, rewrite rules, the response being
//! assembled, formats, naming conventions and template variables. Nothing
//! here performs I/O; templates, configuration and sessions are reached
//! through ports defined in the application layer.
//!
//! - **No async**: dispatch is synchronous and request scoped
//! - **No I/O**: no filesystem or network calls
//! - **Value types**: everything is `Clone` and compares by value

pub mod error;
pub mod format;
pub mod naming;
pub mod response;
pub mod routing;
pub mod uri;
pub mod view_state;

pub use error::{DomainError, ErrorCategory};
pub use response::{CONTENT_TYPE, LOCATION, Response};
pub use routing::{PlaceholderTable, RouteResolver, RouteRule};
pub use uri::{PathCursor, Uri};
pub use view_state::{ErrorEntry, ViewState};
