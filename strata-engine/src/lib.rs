//! # strata-engine
//!
//! Runs models across a scenario x participant matrix and judges the results.
//!
//! ### Key Submodules:
//! - `arena`: matrix execution into tidy per-step and per-episode tables
//! - `tournament`: scoring and per-(scenario, episode) voting on top of an arena
//! - `voting`: argmax, majority, weighted and Borda rules

pub mod arena;
pub mod error;
pub mod table;
pub mod tournament;
pub mod voting;

pub use arena::{Arena, ArenaOutput, ModelSource};
pub use error::{ArenaError, TournamentError, VotingError};
pub use table::{Row, Table, VoteRow};
pub use tournament::{metric_score, PlayResult, Tournament};
pub use voting::{argmax, borda_count, majority_vote, weighted_vote, Voter, VotingRule};
