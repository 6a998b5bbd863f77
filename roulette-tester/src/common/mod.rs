pub mod roster;
pub mod scenario;
pub mod util;

pub use roster::{RosterSource, load_roster};
pub use util::split_csv;
