pub mod cache;
pub mod core;
pub mod error;
pub mod materialize;
pub mod resolver;
pub mod select;
pub mod utils;
pub mod ytdlp;

#[cfg(feature = "server")]
pub mod server;

#[cfg(test)]
mod testing;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use crate::core::{Container, Extractor, Preference, VideoInfo};
pub use error::{Result, TikFreeError};
pub use materialize::{MaterializedDownload, Materializer, Strategy, StrategyOutcome};
pub use resolver::Resolver;
pub use ytdlp::YtDlp;
