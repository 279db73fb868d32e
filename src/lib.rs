pub mod container;
pub mod error;
pub mod events;
pub mod header;
pub mod matches;
mod operator_roles;
pub mod operators;
pub mod payload;
mod player;
pub mod reader;
mod scan;
pub mod scoreboard;
pub mod stats;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::Error;
pub use events::{MatchUpdate, MatchUpdateType};
pub use header::{GameMode, Header, Map, MatchType, Player, Team, WinCondition};
pub use matches::MatchReader;
pub use operators::{Operator, Role};
pub use reader::RoundReader;
pub use stats::{PlayerMatchStats, PlayerRoundStats};
