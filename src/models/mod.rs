pub mod carrier;
pub mod queue;

pub use carrier::{actionable_only, parse_pending_count, CarrierMethod, RawCarrierEntry};
pub use queue::{advance_on_tab_close, BatchQueue, QueueTransition};
