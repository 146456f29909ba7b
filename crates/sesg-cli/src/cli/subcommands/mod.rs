mod config;
mod db;
mod experiment;
mod results;
mod review;
mod strings;

pub use config::ConfigCommands;
pub use db::DbCommands;
pub use experiment::{ExperimentCommands, SearchArgs, StartArgs};
pub use results::ResultsCommands;
pub use review::ReviewCommands;
pub use strings::StringsCommands;
