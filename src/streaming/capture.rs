//! Microphone capture using cpal
//!
//! Opens an input device, converts every callback buffer to mono `f32` and
//! feeds it to a [`StreamingAdapter`] running on the capture thread. Results
//! come out of the adapter's mailbox.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use serde::Serialize;

use super::adapter::{BlockFailure, LiveUpdate, StreamCounters, StreamingAdapter};
use super::mailbox::LatestMailbox;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::downmix_into;

/// Description of one input device
#[derive(Debug, Clone, Serialize)]
pub struct InputDeviceInfo {
    /// Position in the host's device list, usable with [`LiveCapture::start`]
    pub index: usize,
    /// Device name reported by the host
    pub name: String,
    /// Default input sample rate in Hz, if the device reports a config
    pub default_sample_rate: Option<u32>,
    /// Default channel count, if the device reports a config
    pub channels: Option<u16>,
    /// Whether this is the host's default input
    pub is_default: bool,
}

fn device_error(context: &str, err: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::DeviceError(format!("{}: {}", context, err))
}

/// List input devices of the default host
pub fn list_input_devices() -> Result<Vec<InputDeviceInfo>, AnalysisError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host
        .input_devices()
        .map_err(|e| device_error("Cannot enumerate input devices", e))?;

    Ok(devices
        .enumerate()
        .map(|(index, device)| {
            let name = device.name().unwrap_or_else(|_| "<unknown>".to_string());
            let config = device.default_input_config().ok();
            InputDeviceInfo {
                index,
                is_default: default_name.as_deref() == Some(name.as_str()),
                default_sample_rate: config.as_ref().map(|c| c.sample_rate().0),
                channels: config.as_ref().map(|c| c.channels()),
                name,
            }
        })
        .collect())
}

fn select_device(index: Option<usize>) -> Result<Device, AnalysisError> {
    let host = cpal::default_host();
    match index {
        Some(index) => host
            .input_devices()
            .map_err(|e| device_error("Cannot enumerate input devices", e))?
            .nth(index)
            .ok_or_else(|| AnalysisError::DeviceError(format!("No input device #{}", index))),
        None => host
            .default_input_device()
            .ok_or_else(|| AnalysisError::DeviceError("No default input device".to_string())),
    }
}

/// Running microphone capture; dropping it stops the stream
pub struct LiveCapture {
    stream: Stream,
    mailbox: Arc<LatestMailbox<LiveUpdate>>,
    failures: Arc<LatestMailbox<BlockFailure>>,
    counters: Arc<StreamCounters>,
    device_name: String,
    sample_rate: u32,
}

impl LiveCapture {
    /// Open a device (default input when `device` is `None`) and start analysing
    ///
    /// The pipeline is built for the device's default sample rate.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::DeviceError` if the device cannot be opened or
    /// uses an unsupported sample format, or the pipeline construction error
    /// for an invalid configuration.
    pub fn start(device: Option<usize>, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        let device = select_device(device)?;
        let device_name = device.name().unwrap_or_else(|_| "<unknown>".to_string());

        let supported = device
            .default_input_config()
            .map_err(|e| device_error("Failed to get input config", e))?;
        let sample_format = supported.sample_format();
        let stream_config: StreamConfig = supported.into();
        let sample_rate = stream_config.sample_rate.0;

        let adapter = StreamingAdapter::new(sample_rate, config)?;
        let mailbox = adapter.mailbox();
        let failures = adapter.failures();
        let counters = adapter.counters();

        log::info!(
            "Capturing from '{}': {} Hz, {} channels, {:?}",
            device_name,
            sample_rate,
            stream_config.channels,
            sample_format
        );

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, adapter)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, adapter)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, adapter)?,
            other => {
                return Err(AnalysisError::DeviceError(format!(
                    "Unsupported sample format: {}",
                    other
                )))
            }
        };

        stream
            .play()
            .map_err(|e| device_error("Failed to start input stream", e))?;

        Ok(Self {
            stream,
            mailbox,
            failures,
            counters,
            device_name,
            sample_rate,
        })
    }

    /// Mailbox receiving reportable updates
    pub fn mailbox(&self) -> Arc<LatestMailbox<LiveUpdate>> {
        Arc::clone(&self.mailbox)
    }

    /// Mailbox receiving the most recent block failure
    pub fn failures(&self) -> Arc<LatestMailbox<BlockFailure>> {
        Arc::clone(&self.failures)
    }

    /// Block counters of the running adapter
    pub fn counters(&self) -> Arc<StreamCounters> {
        Arc::clone(&self.counters)
    }

    /// Name of the capturing device
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Capture sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stop capturing and wake any mailbox waiters
    pub fn stop(self) {
        if let Err(e) = self.stream.pause() {
            log::warn!("Failed to pause input stream: {}", e);
        }
        self.mailbox.close();
        self.failures.close();
        log::info!("Capture stopped: {:?}", self.counters.snapshot());
    }
}

fn build_stream<S>(
    device: &Device,
    config: &StreamConfig,
    mut adapter: StreamingAdapter,
) -> Result<Stream, AnalysisError>
where
    S: SizedSample,
    f32: FromSample<S>,
{
    let channels = config.channels as usize;
    let capacity = adapter.block_size() * channels;
    let mut converted: Vec<f32> = Vec::with_capacity(capacity);
    let mut mono: Vec<f32> = Vec::with_capacity(capacity);

    device
        .build_input_stream(
            config,
            move |data: &[S], _: &cpal::InputCallbackInfo| {
                converted.clear();
                converted.extend(data.iter().map(|&s| s.to_sample::<f32>()));
                mono.clear();
                downmix_into(&converted, channels, &mut mono);
                adapter.push_samples(&mono);
            },
            |err| {
                log::error!("Audio input error: {}", err);
            },
            None,
        )
        .map_err(|e| device_error("Failed to build input stream", e))
}
