//! Matching state shared between the pack and parse phases.
//!
//! - `correlate`: pairs a client episode file with an entry of the real
//!   season-pack listing
//! - `pending`: matches recorded by the pack phase, awaiting the parse phase

mod correlate;
mod pending;

pub use correlate::{correlate_episode, match_episode_file, CorrelationError};
pub use pending::{PendingMatch, PendingMatchSet, PendingMatchStore};
