//! Command handlers for the docgate CLI.

pub mod ask;
pub mod load;
pub mod roles;
pub mod stats;

pub use ask::AskCommand;
pub use load::LoadCommand;
pub use roles::RolesCommand;
pub use stats::StatsCommand;
