pub mod data;
pub mod topic;

pub use data::{ChannelRecord, DeviceRecord, DiMap, RawEvent, RawPayload, Snapshot, TelemetryEvent};
pub use topic::{make_key, parse_topic};
