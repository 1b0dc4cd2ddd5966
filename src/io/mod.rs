// IO module - offline acquisition and persistence around the core
//
// The screening core never touches devices or storage. This module holds
// the adapters a host or the CLI uses to replay recorded streams into a
// session and to hand finalized reports to a store.

pub mod driver;
pub mod sink;
pub mod source;

pub use driver::drive;
pub use sink::{load_report, JsonFileSink, MemorySink, ResultSink};
pub use source::{JsonLinesSource, SampleSource, SyntheticTremorSource, WavAudioSource};
