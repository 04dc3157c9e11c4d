pub mod error;
pub mod types;
pub mod ring_buffer;
pub mod pubsub;
pub mod scan_buffer;
pub mod run_state;
pub mod actuator;
pub mod transport;
pub mod mcu;
pub mod sim;
pub mod assembler;
pub mod acquisition;
pub mod config;
pub mod scanner;

pub use error::{Error, Result, BufferUnavailable};
pub use types::{RangeReading, RangeSample, Slice, TiltAngle};
pub use ring_buffer::RingBuffer;

pub use pubsub::{
    Message, Topic,
    Publisher, Subscriber,
    TopicRegistry,
};

pub use scan_buffer::{ScanBuffer, ScanFeed};
pub use run_state::{RunState, RunStateController};
pub use actuator::{ActuatorLink, ScriptedActuator};
pub use mcu::{McuLink, McuLinkConfig};
pub use assembler::{Assembler, SliceCollector, SlicePublisher};
pub use acquisition::{AcquisitionState, SliceAcquirer, SnapshotPolicy};
pub use config::ScannerConfig;
pub use scanner::{CycleOutcome, TiltingScanner};
