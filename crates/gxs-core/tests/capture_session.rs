//! End-to-end capture sessions against the simulated device.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use gxs_core::protocol::constants::*;
use gxs_core::transport::MockBulk;
use gxs_core::{
    CaptureEvent, CaptureObserver, CapturePhase, CaptureSession, DeviceState, GxsError,
    MockTransport, RegisterSpace, SessionConfig, UsbTransport,
};

const STAMP: &str = "2015/03/19-21:44:43:087";

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<CaptureEvent>>,
}

impl Recorder {
    fn phases(&self, attempt: usize) -> Vec<CapturePhase> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                CaptureEvent::PhaseChanged { attempt: a, to, .. } if *a == attempt => Some(*to),
                _ => None,
            })
            .collect()
    }
}

impl CaptureObserver for Recorder {
    fn on_event(&self, event: &CaptureEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn config() -> SessionConfig {
    SessionConfig {
        exposure_timestamp: Some(STAMP.into()),
        pump_interval_ms: 5,
        transfer_timeout_ms: 100,
        ..Default::default()
    }
}

fn session(mock: &MockTransport) -> (CaptureSession<MockTransport, Recorder>, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let session = CaptureSession::with_observer(mock.clone(), config(), recorder.clone()).unwrap();
    (session, recorder)
}

/// Script one exposure: idle before arming, a transient state, the latched
/// frame, then idle for the three cleanup checks.
fn script_capture(mock: &MockTransport, fill: u8) {
    mock.queue_states(&[
        DeviceState::Idle,
        DeviceState::Transient1,
        DeviceState::CaptureReady,
        DeviceState::Idle,
        DeviceState::Idle,
        DeviceState::Idle,
    ]);
    mock.queue_bulk_stream(&vec![fill; FRAME_SZ], BULK_CHUNK_SIZE);
}

#[test]
fn capture_n_runs_each_attempt_and_disarms_once() {
    let mock = MockTransport::new();
    for fill in [0x10, 0x20, 0x30] {
        script_capture(&mock, fill);
    }
    let (mut session, recorder) = session(&mock);

    let mut frames = Vec::new();
    session
        .capture_n(3, |frame| {
            assert_eq!(mock.pending_bulk(), 0);
            frames.push(frame.as_bytes()[0]);
            Ok::<(), GxsError>(())
        })
        .unwrap();

    assert_eq!(frames, vec![0x10, 0x20, 0x30]);
    assert_eq!(mock.count(OP_TRIGGER_DISARM), 1);
    // Armed before each wait and re-armed by each cleanup
    assert_eq!(mock.count(OP_TRIGGER_ARM), 6);
    assert!(mock.max_outstanding() <= 304);
    assert_eq!(mock.bulk_remaining(), 0);

    let last = mock.control_log().pop().unwrap();
    assert_eq!(last.value, OP_TRIGGER_DISARM);

    assert_eq!(
        recorder.phases(1),
        vec![
            CapturePhase::PreCheck,
            CapturePhase::Armed,
            CapturePhase::Polling,
            CapturePhase::Draining,
            CapturePhase::PostCheck,
            CapturePhase::Done,
        ]
    );
    let events = recorder.events.lock().unwrap();
    assert!(matches!(events.last(), Some(CaptureEvent::Complete { frames: 3 })));
}

#[test]
fn capture_one_decodes_and_stamps_eeprom() {
    let mock = MockTransport::new();
    script_capture(&mock, 0x00);
    let (mut session, _) = session(&mock);

    let image = session.capture_one().unwrap();
    assert_eq!((image.width(), image.height()), (1344, 1850));
    assert!(image.as_bytes().iter().all(|&p| p == 255));

    assert_eq!(
        mock.memory(RegisterSpace::Eeprom, EEPROM_TIMESTAMP_ADDR, EEPROM_TIMESTAMP_LEN),
        STAMP.as_bytes()
    );
    assert_eq!(session.exposure_timestamp().unwrap(), STAMP);
    assert_eq!(mock.integration_time(), INTEGRATION_TIME_DEFAULT);
    assert_eq!(mock.capture_mode(), 0);
}

#[test]
fn generated_timestamp_has_eeprom_length() {
    let mock = MockTransport::new();
    script_capture(&mock, 0x00);
    let config = SessionConfig {
        exposure_timestamp: None,
        pump_interval_ms: 5,
        ..Default::default()
    };
    let mut session = CaptureSession::new(mock.clone(), config).unwrap();

    session.capture_raw().unwrap();
    let stamp = session.exposure_timestamp().unwrap();
    assert_eq!(stamp.len(), EEPROM_TIMESTAMP_LEN);
    assert_eq!(&stamp[4..5], "/");
    assert_eq!(&stamp[10..11], "-");
}

#[test]
fn geometry_mismatch_aborts_before_arming() {
    let mock = MockTransport::new();
    mock.queue_read(OP_GEOMETRY_READ, &[0x05, 0x40, 0x07, 0x00]);
    let (mut session, recorder) = session(&mock);

    let err = session.capture_raw().unwrap_err();
    assert!(matches!(
        err,
        GxsError::GeometryMismatch {
            got: (1344, 0x0700),
            want: (1344, 1850)
        }
    ));
    assert_eq!(mock.count(OP_TRIGGER_ARM), 0);
    assert_eq!(mock.count(OP_TRIGGER_DISARM), 1);
    assert_eq!(session.phase(), CapturePhase::Failed);
    assert_eq!(recorder.phases(1), vec![CapturePhase::PreCheck, CapturePhase::Failed]);
}

#[test]
fn truncated_frame_skips_cleanup() {
    let mock = MockTransport::new();
    mock.queue_states(&[DeviceState::Idle, DeviceState::CaptureReady]);
    mock.queue_bulk_stream(&vec![0u8; FRAME_SZ - 0x3000], BULK_CHUNK_SIZE);
    let (mut session, _) = session(&mock);

    let err = session.capture_raw().unwrap_err();
    assert!(matches!(
        err,
        GxsError::TruncatedFrame {
            got,
            expected: FRAME_SZ
        } if got == FRAME_SZ - 0x3000
    ));
    assert_eq!(mock.count(OP_EEPROM_WRITE), 0);
    assert_eq!(mock.count(OP_TRIGGER_DISARM), 1);
    assert_eq!(mock.pending_bulk(), 0);
}

#[test]
fn stalled_bulk_stream_times_out() {
    let mock = MockTransport::new();
    mock.queue_states(&[DeviceState::Idle, DeviceState::CaptureReady]);
    mock.queue_bulk(MockBulk::Data(vec![0u8; BULK_CHUNK_SIZE]));
    mock.queue_bulk(MockBulk::TimedOut);
    let (mut session, _) = session(&mock);

    let err = session.capture_raw().unwrap_err();
    assert!(matches!(err, GxsError::TransferTimeout { transfer: 1, .. }));
    assert_eq!(mock.pending_bulk(), 0);
}

#[test]
fn device_error_while_polling() {
    let mock = MockTransport::new();
    mock.queue_states(&[
        DeviceState::Idle,
        DeviceState::Transient1,
        DeviceState::Transient2,
    ]);
    // PreCheck reads the error register once before polling starts.
    mock.queue_errors(&[0, 0, 4]);
    let (mut session, _) = session(&mock);

    let err = session.capture_raw().unwrap_err();
    assert!(matches!(err, GxsError::DeviceError { code: 4 }));
    assert_eq!(mock.bulk_submitted(), 0);
    assert_eq!(mock.count(OP_TRIGGER_DISARM), 1);
}

#[test]
fn signature_checked_before_drain() {
    let mock = MockTransport::new();
    script_capture(&mock, 0x00);
    mock.set_signature(0xBEEF);
    let (mut session, _) = session(&mock);

    let err = session.capture_raw().unwrap_err();
    assert!(matches!(err, GxsError::Signature { got: 0xBEEF, .. }));
    assert_eq!(mock.bulk_submitted(), 0);
}

#[test]
fn callback_error_stops_batch() {
    let mock = MockTransport::new();
    for _ in 0..3 {
        script_capture(&mock, 0x00);
    }
    let (mut session, _) = session(&mock);

    let mut calls = 0;
    let result = session.capture_n(3, |_| {
        calls += 1;
        if calls == 2 {
            Err(GxsError::Config("disk full".into()))
        } else {
            Ok(())
        }
    });

    assert!(matches!(result, Err(GxsError::Config(_))));
    assert_eq!(calls, 2);
    assert_eq!(mock.count(OP_TRIGGER_DISARM), 1);
}

#[test]
fn frame_delivered_before_cleanup_fault() {
    let mock = MockTransport::new();
    mock.queue_states(&[
        DeviceState::Idle,
        DeviceState::CaptureReady,
        DeviceState::Transient1,
    ]);
    mock.queue_bulk_stream(&vec![0x55; FRAME_SZ], BULK_CHUNK_SIZE);
    let (mut session, recorder) = session(&mock);

    let mut delivered = Vec::new();
    let result = session.capture_n(3, |frame| {
        delivered.push(frame.len());
        Ok::<(), GxsError>(())
    });

    assert!(matches!(
        result,
        Err(GxsError::UnexpectedState {
            got: DeviceState::Transient1,
            want: DeviceState::Idle
        })
    ));
    assert_eq!(delivered, vec![FRAME_SZ]);
    assert_eq!(mock.count(OP_EEPROM_WRITE), 0);
    assert_eq!(mock.count(OP_TRIGGER_DISARM), 1);
    assert_eq!(
        recorder.phases(1),
        vec![
            CapturePhase::PreCheck,
            CapturePhase::Armed,
            CapturePhase::Polling,
            CapturePhase::Draining,
            CapturePhase::PostCheck,
            CapturePhase::Failed,
        ]
    );
}

#[test]
fn fault_after_final_geometry_write_is_caught() {
    let mock = MockTransport::new();
    mock.queue_states(&[DeviceState::Idle, DeviceState::CaptureReady]);
    // Five clean error reads, then a fault on the last cleanup check.
    mock.queue_errors(&[0, 0, 0, 0, 0, 0x21]);
    mock.queue_bulk_stream(&vec![0u8; FRAME_SZ], BULK_CHUNK_SIZE);
    let (mut session, _) = session(&mock);

    let err = session.capture_raw().unwrap_err();
    assert!(matches!(err, GxsError::DeviceError { code: 0x21 }));
    // Geometry affirmed in pre-check and again at the end of cleanup.
    assert_eq!(mock.count(OP_GEOMETRY_WRITE), 2);
}

#[test]
fn disarm_failure_does_not_mask_capture_error() {
    let mock = MockTransport::new();
    script_capture(&mock, 0x00);
    let (mut session, _) = session(&mock);

    // Unplugged while the frame is being handled, so the disarm fails too.
    let result = session.capture_n(1, |_| {
        mock.disconnect();
        Err(GxsError::Config("write failed".into()))
    });
    assert!(matches!(result, Err(GxsError::Config(msg)) if msg == "write failed"));
    assert_eq!(mock.count(OP_TRIGGER_DISARM), 0);
}

#[test]
fn wait_hook_runs_once_per_attempt() {
    let mock = MockTransport::new();
    script_capture(&mock, 0x00);
    script_capture(&mock, 0x00);
    let (mut session, _) = session(&mock);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    session.set_on_wait(Some(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })));

    session.capture_n(2, |_| Ok::<(), GxsError>(())).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn cancelled_wait() {
    let mock = MockTransport::new();
    let (mut session, _) = session(&mock);
    session.cancel_token().cancel();

    let err = session.capture_raw().unwrap_err();
    assert!(matches!(err, GxsError::Cancelled));
    assert_eq!(mock.count(OP_TRIGGER_ARM), 1);
    assert_eq!(mock.count(OP_TRIGGER_DISARM), 1);
}

#[test]
fn cancellation_sticks_until_reset() {
    let mock = MockTransport::new();
    let (mut session, _) = session(&mock);
    let token = session.cancel_token();
    token.cancel();

    assert!(matches!(session.capture_raw(), Err(GxsError::Cancelled)));
    assert!(matches!(session.capture_raw(), Err(GxsError::Cancelled)));

    token.reset();
    script_capture(&mock, 0x00);
    assert_eq!(session.capture_raw().unwrap().len(), FRAME_SZ);
}

#[test]
fn initialize_then_capture() {
    let mock = MockTransport::new();
    let (mut session, recorder) = session(&mock);

    let report = session.initialize().unwrap();
    assert_eq!(report.initial_state, DeviceState::Idle);
    assert_eq!(session.phase(), CapturePhase::Idle);
    assert_eq!(
        recorder.phases(0),
        vec![CapturePhase::Initializing, CapturePhase::Idle]
    );

    script_capture(&mock, 0x7F);
    let raw = session.capture_raw().unwrap();
    assert_eq!(raw.len(), FRAME_SZ);
    assert_eq!(session.read_state().unwrap(), DeviceState::Idle);
    assert_eq!(session.read_versions().unwrap().mcu.to_string(), "0.5.10");
}

#[test]
fn session_reports_device_ids() {
    let mock = MockTransport::new();
    let (session, recorder) = session(&mock);
    let events = recorder.events.lock().unwrap();
    assert!(matches!(
        events.first(),
        Some(CaptureEvent::DeviceConnected {
            vid: 0x5328,
            pid: 0x2020
        })
    ));
    assert_eq!(session.registers().transport().vendor_id(), GXS_VENDOR_ID);
}
