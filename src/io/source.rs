//! Sample sources for offline sessions.
//!
//! Live device acquisition belongs to the host application. These sources
//! replay recorded or generated streams into a session so the core can be
//! exercised without a microphone, camera or motion sensor: WAV recordings
//! for voice, JSON-lines recordings for any domain, and a deterministic
//! synthetic tremor generator.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::AssessmentError;
use crate::sample::TimedSample;

/// Frame length used when splitting WAV recordings (~21 ms at 48 kHz)
pub const DEFAULT_FRAME_LEN: usize = 1024;

/// Pull-based stream of timestamped samples.
///
/// `Ok(None)` marks the end of the stream; an `Err` means acquisition failed
/// and the stream cannot continue.
pub trait SampleSource {
    fn next_sample(&mut self) -> Result<Option<TimedSample>, AssessmentError>;
}

fn device_error(reason: String) -> AssessmentError {
    AssessmentError::DeviceUnavailable { reason }
}

/// Mono PCM split into fixed-length audio frames.
pub struct WavAudioSource {
    samples: Vec<f32>,
    sample_rate: u32,
    frame_len: usize,
    position: usize,
}

impl WavAudioSource {
    /// Load a WAV file, mixing multi-channel audio down to mono.
    pub fn open(path: &Path, frame_len: usize) -> Result<Self, AssessmentError> {
        let (samples, sample_rate) = read_wav(path)?;
        log::info!(
            "[WavAudioSource] Loaded {} samples @ {} Hz from {}",
            samples.len(),
            sample_rate,
            path.display()
        );
        Self::from_samples(samples, sample_rate, frame_len)
    }

    pub fn from_samples(
        samples: Vec<f32>,
        sample_rate: u32,
        frame_len: usize,
    ) -> Result<Self, AssessmentError> {
        if sample_rate == 0 {
            return Err(device_error("audio stream reports a 0 Hz sample rate".into()));
        }
        if frame_len == 0 {
            return Err(AssessmentError::invalid_config(
                "frame_len",
                "must be at least one sample",
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
            frame_len,
            position: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total duration of the recording
    pub fn duration_ms(&self) -> f64 {
        self.samples.len() as f64 * 1000.0 / self.sample_rate as f64
    }
}

impl SampleSource for WavAudioSource {
    fn next_sample(&mut self) -> Result<Option<TimedSample>, AssessmentError> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }
        let end = (self.position + self.frame_len).min(self.samples.len());
        let timestamp_ms = self.position as f64 * 1000.0 / self.sample_rate as f64;
        let frame = self.samples[self.position..end].to_vec();
        self.position = end;
        Ok(Some(TimedSample::audio(timestamp_ms, frame, self.sample_rate)))
    }
}

fn read_wav(path: &Path) -> Result<(Vec<f32>, u32), AssessmentError> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|err| device_error(format!("failed to open {}: {err}", path.display())))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(device_error(format!("{} has zero channels", path.display())));
    }

    let read_err = |err: hound::Error| device_error(format!("error reading {}: {err}", path.display()));
    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(read_err))
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .map(|sample| sample.map(|v| v as f32 / i16::MAX as f32).map_err(read_err))
                .collect::<Result<Vec<f32>, _>>()?,
            24 | 32 => {
                let full_scale = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|v| v as f32 / full_scale).map_err(read_err))
                    .collect::<Result<Vec<f32>, _>>()?
            }
            bits => {
                return Err(device_error(format!(
                    "unsupported bits_per_sample={} for {}",
                    bits,
                    path.display()
                )))
            }
        },
    };

    if spec.channels == 1 {
        return Ok((samples, spec.sample_rate));
    }

    let channels = spec.channels as usize;
    let mono = samples
        .chunks(channels)
        .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

/// Recorded stream with one JSON-encoded `TimedSample` per line.
///
/// Blank lines are skipped. A line that does not parse ends the stream
/// with `DeviceUnavailable`, the same as a sensor dropping out.
pub struct JsonLinesSource<R: BufRead> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, AssessmentError> {
        let file = File::open(path)
            .map_err(|err| device_error(format!("failed to open {}: {err}", path.display())))?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> SampleSource for JsonLinesSource<R> {
    fn next_sample(&mut self) -> Result<Option<TimedSample>, AssessmentError> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line.map_err(|err| device_error(format!("read failed: {err}")))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let sample = serde_json::from_str(trimmed).map_err(|err| {
                device_error(format!("malformed sample on line {}: {err}", self.line_no))
            })?;
            return Ok(Some(sample));
        }
        Ok(None)
    }
}

/// Deterministic hand-tremor generator
///
/// Emits motion vectors whose x axis oscillates at `frequency_hz` with peak
/// displacement `amplitude_mm`, plus uniform sensor noise on every axis.
pub struct SyntheticTremorSource {
    frequency_hz: f64,
    amplitude_mm: f64,
    rate_hz: f64,
    total: usize,
    index: usize,
    noise_mm: f64,
    rng: StdRng,
}

impl SyntheticTremorSource {
    pub fn new(frequency_hz: f64, amplitude_mm: f64, seconds: f64, rate_hz: f64, seed: u64) -> Self {
        let total = if seconds > 0.0 && rate_hz > 0.0 {
            (seconds * rate_hz).round() as usize
        } else {
            0
        };
        Self {
            frequency_hz,
            amplitude_mm,
            rate_hz,
            total,
            index: 0,
            noise_mm: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Add uniform noise in `[-noise_mm, noise_mm]` to every axis
    pub fn with_noise(mut self, noise_mm: f64) -> Self {
        self.noise_mm = noise_mm.abs();
        self
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    fn noise(&mut self) -> f64 {
        if self.noise_mm > 0.0 {
            self.rng.gen_range(-self.noise_mm..=self.noise_mm)
        } else {
            0.0
        }
    }
}

impl SampleSource for SyntheticTremorSource {
    fn next_sample(&mut self) -> Result<Option<TimedSample>, AssessmentError> {
        if self.index >= self.total {
            return Ok(None);
        }
        let t = self.index as f64 / self.rate_hz;
        self.index += 1;
        let x = self.amplitude_mm * (2.0 * PI * self.frequency_hz * t).sin() + self.noise();
        let y = self.noise();
        let z = self.noise();
        Ok(Some(TimedSample::motion(t * 1000.0, x, y, z)))
    }
}
