pub mod carrier_ctx;
pub mod shipment_flow;

pub use carrier_ctx::CarrierCtx;
pub use shipment_flow::{success_message, FlowSummary, ShipmentFlow};
