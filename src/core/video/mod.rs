pub mod decoder;
pub mod frame;
pub mod normalizer;
pub mod probe;
pub mod record;
pub mod sequence;
pub mod source;

pub use decoder::RadiometricDecoder;
pub use frame::ColorFrame;
pub use normalizer::WindowBounds;
pub use probe::{probe, probe_clamped, DisplayMapping, ProbeReading};
pub use record::FrameRecord;
pub use sequence::{load_from_source, FrameSequence, LoadOptions, LoadReport, SkippedFrame};
pub use source::{FrameSource, ImageSetSource, MemorySource};
