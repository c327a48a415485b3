//! Hoist plugin system
//!
//! Plugins (stages) wrap an upload call without knowing which backend runs
//! it. A stage observes the call on the way in (`before`), may take over the
//! call entirely (`around`), and may rewrite the result on the way out
//! (`after`).
//!
//! Composition is strict nesting driven by one fixed driver: for stages
//! [p1, p2, ..., pn], pn is outermost: hooks run outer-to-inner on entry
//! and inner-to-outer on exit. Stage instances are built fresh for every
//! call by the [`registry::StageRegistry`], so per-call mutable state (a
//! start instant, a recorded input) never leaks across calls.

pub mod clipboard;
pub mod logging;
pub mod markdown_link;
pub mod registry;
pub mod stage;
pub mod timing;

pub use clipboard::ClipboardStage;
pub use logging::LoggingStage;
pub use markdown_link::MarkdownLinkStage;
pub use registry::{StageFactory, StageRegistry};
pub use stage::{Next, PluginError, PluginResult, UploadPipeline, UploadStage};
pub use timing::TimingStage;
