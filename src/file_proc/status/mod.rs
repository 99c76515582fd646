mod handler;
mod progress_bars;
mod types;

pub use self::handler::handle_status;
pub use self::types::*;
