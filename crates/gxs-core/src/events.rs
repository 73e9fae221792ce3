//! Event system for UI decoupling.
//!
//! Allows the CLI (or any other front end) to follow capture progress
//! without tight coupling to the core logic.

use std::fmt;

/// Phases of one capture attempt, plus device bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    /// No capture in progress.
    Idle,
    /// One-time FPGA bring-up.
    Initializing,
    /// Validating the device before arming.
    PreCheck,
    /// Trigger armed.
    Armed,
    /// Polling the state register for a latched frame.
    Polling,
    /// Reading the frame from the bulk endpoint.
    Draining,
    /// Post-capture validation and cleanup.
    PostCheck,
    /// Attempt finished with a frame.
    Done,
    /// Attempt aborted by a fault.
    Failed,
}

impl fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapturePhase::Idle => write!(f, "Idle"),
            CapturePhase::Initializing => write!(f, "Initializing"),
            CapturePhase::PreCheck => write!(f, "Pre-check"),
            CapturePhase::Armed => write!(f, "Armed"),
            CapturePhase::Polling => write!(f, "Polling"),
            CapturePhase::Draining => write!(f, "Draining"),
            CapturePhase::PostCheck => write!(f, "Post-check"),
            CapturePhase::Done => write!(f, "Done"),
            CapturePhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Events emitted by the capture session.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Device opened.
    DeviceConnected { vid: u16, pid: u16 },
    /// Phase changed within an attempt.
    PhaseChanged {
        attempt: usize,
        from: CapturePhase,
        to: CapturePhase,
    },
    /// Progress over a multi-frame capture.
    Progress { current: u64, total: u64 },
    /// A complete frame was drained; cleanup follows.
    FrameCaptured { attempt: usize, bytes: usize },
    /// Error occurred.
    Error { message: String },
    /// All requested frames captured.
    Complete { frames: usize },
}

/// Observer trait for receiving capture events.
///
/// Implement this trait in your UI layer to receive updates.
pub trait CaptureObserver: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &CaptureEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl CaptureObserver for NullObserver {
    fn on_event(&self, _event: &CaptureEvent) {}
}

/// Observer that logs events using tracing.
pub struct TracingObserver;

impl CaptureObserver for TracingObserver {
    fn on_event(&self, event: &CaptureEvent) {
        match event {
            CaptureEvent::DeviceConnected { vid, pid } => {
                tracing::info!(vid = %format!("{:04X}", vid), pid = %format!("{:04X}", pid), "Device connected");
            }
            CaptureEvent::PhaseChanged { attempt, from, to } => {
                tracing::debug!(attempt, from = %from, to = %to, "Phase changed");
            }
            CaptureEvent::Progress { current, total } => {
                tracing::info!(progress = %format!("{}/{}", current, total), "Frames captured");
            }
            CaptureEvent::FrameCaptured { attempt, bytes } => {
                tracing::info!(attempt, bytes, "Frame captured");
            }
            CaptureEvent::Error { message } => {
                tracing::error!("Error: {}", message);
            }
            CaptureEvent::Complete { frames } => {
                tracing::info!(frames, "Capture complete");
            }
        }
    }
}
