pub mod affinity;
pub mod films;
pub mod ledger;
pub mod recommendations;
pub mod users;

pub use affinity::{AffinityIndex, AffinitySnapshot};
pub use ledger::FriendshipLedger;
pub use recommendations::RecommendationEngine;
