// Analysis module - numerical primitives shared by every scoring domain
//
// Architecture:
// - buffer: SampleBuffer windowing with monotonic timestamps and eviction
// - stats: mean/variance/RMS/dB/coefficient-of-variation with fallbacks
// - frequency: zero-crossing and autocorrelation dominant-frequency estimation
// - fft: FFT-backed autocorrelation used by the frequency estimator
// - peaks: falling-through-threshold event counting per channel
// - perturbation: jitter, shimmer and HNR for sustained voice
//
// Data flow: raw stream → SampleBuffer → {FrequencyEstimator, stats,
// PeakDetector} → DomainScorer (see crate::scoring)

pub mod buffer;
pub mod fft;
pub mod frequency;
pub mod peaks;
pub mod perturbation;
pub mod stats;

pub use buffer::{Sample, SampleBuffer};
pub use frequency::{Algorithm, BandPolicy, CrossingReference, FrequencyBand, FrequencyEstimator};
pub use peaks::{Channel, FallingEdge, PeakDetector, PeakEvent, ThresholdMode};
