pub mod event;
pub mod writer;

pub use event::{Event, EventValue};
pub use writer::{find_runs, read_events, sanitize_tag, SummaryWriter};
