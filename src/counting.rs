//! ROI membership and directional flow counting.

mod flow_counter;
mod roi;

pub use flow_counter::{Crossing, FlowCounter, FlowCounts};
pub use roi::Roi;
