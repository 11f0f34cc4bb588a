//! lineage-session: owns the lineage view state for one user session.
//!
//! Wraps the pure engine in `lineage-core` with the parts that touch the
//! outside world: paginated asset/relationship collaborators, a
//! generation counter that discards responses overtaken by newer requests,
//! validated settings, and a status report. The derived state is a single
//! immutable `Arc<GraphState>` replaced wholesale on every change.

mod config;
mod error;
mod generation;
mod source;
mod state;
mod status;

pub use config::{SessionConfig, MAX_ASSET_PAGES_RANGE, PAGE_SIZE_RANGE};
pub use error::{Result, SessionError};
pub use generation::{FetchReason, FetchTicket, Generation, GenerationCounter};
pub use source::{collect_assets, load_snapshot, AssetPage, AssetSource, RelationshipSource};
pub use state::{FetchOutcome, GraphState, LineageSession};
pub use status::{LineageStatus, SessionStatus};
