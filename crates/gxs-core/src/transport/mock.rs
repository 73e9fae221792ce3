//! Mock USB transport for testing.
//!
//! `MockTransport` simulates a GXS700 well enough to drive the register
//! layer, the state machine, the bulk reader and whole capture sessions
//! without hardware. Clones share one device, so a test can keep a handle
//! for scripting and inspection after moving the transport into a session.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::traits::{
    BulkCompletion, BulkHandler, BulkStatus, Disposition, TransferId, TransportError, UsbTransport,
};
use crate::protocol::constants::*;
use crate::protocol::{DeviceState, RegisterSpace};

/// Direction of a logged control transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlDirection {
    In,
    Out,
}

/// One control transfer seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRecord {
    pub direction: ControlDirection,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    /// Requested length for IN, payload length for OUT
    pub length: usize,
    /// Payload for OUT transfers, empty for IN
    pub data: Vec<u8>,
}

/// One scripted bulk completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBulk {
    /// Deliver these bytes (truncated to the requested length)
    Data(Vec<u8>),
    /// Report the transfer as timed out
    TimedOut,
    /// Report a transfer failure
    Fail(String),
}

#[derive(Debug)]
struct MockState {
    connected: bool,
    /// Scripted replies per opcode, consumed before the defaults below
    read_queues: HashMap<u16, VecDeque<Vec<u8>>>,
    state: u8,
    error: u8,
    signature: u16,
    versions: Vec<u8>,
    image_counter: Vec<u8>,
    geometry: [u8; 4],
    integration_time: u16,
    capture_mode: u16,
    trigger_params: Vec<u8>,
    /// Byte addressed EEPROM, flash and I2C contents
    memory: HashMap<RegisterSpace, BTreeMap<u16, u8>>,
    /// Word addressed FPGA registers
    fpga: BTreeMap<u16, u16>,
    /// One-shot short write per opcode: bytes reported as written
    short_writes: HashMap<u16, usize>,
    log: Vec<ControlRecord>,

    bulk_script: VecDeque<MockBulk>,
    outstanding: VecDeque<(TransferId, usize)>,
    bulk_submitted: usize,
    max_outstanding: usize,
    bulk_cancelled: usize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            connected: true,
            read_queues: HashMap::new(),
            state: DeviceState::IDLE,
            error: 0,
            signature: FPGA_SIGNATURE,
            // MCU 0.5.10, FPGA 0.3.6, FPGA WG 0.4.5
            versions: vec![
                0x00, 0x05, 0x00, 0x0A, 0x00, 0x03, 0x00, 0x06, 0x00, 0x04, 0x00, 0x05,
            ],
            image_counter: vec![0x8E, 0x00, 0x00, 0x00, 0x58, 0x00, 0x00, 0x00],
            geometry: [0; 4],
            integration_time: 0,
            capture_mode: 0,
            trigger_params: vec![0; TRIGGER_PARAM_LEN],
            memory: HashMap::new(),
            fpga: BTreeMap::new(),
            short_writes: HashMap::new(),
            log: Vec::new(),
            bulk_script: VecDeque::new(),
            outstanding: VecDeque::new(),
            bulk_submitted: 0,
            max_outstanding: 0,
            bulk_cancelled: 0,
        }
    }
}

impl MockState {
    fn read_reply(&mut self, value: u16, index: u16, length: usize) -> Vec<u8> {
        if let Some(reply) = self.read_queues.get_mut(&value).and_then(|q| q.pop_front()) {
            return reply;
        }
        match value {
            OP_STATE => vec![self.state],
            OP_ERROR => vec![self.error],
            OP_FPGA_SIGNATURE => self.signature.to_be_bytes().to_vec(),
            OP_VERSIONS => self.versions.clone(),
            OP_IMAGE_COUNTER_READ => self.image_counter.clone(),
            OP_GEOMETRY_READ => self.geometry.to_vec(),
            OP_INTEGRATION_READ => {
                let t = self.integration_time.to_be_bytes();
                vec![t[0], t[1], 0x00, 0x00]
            }
            OP_TRIGGER_PARAM_READ => self.trigger_params.clone(),
            OP_FPGA_READ => (0..(length / 2) as u16)
                .flat_map(|i| {
                    let reg = index.wrapping_add(i);
                    self.fpga.get(&reg).copied().unwrap_or(0).to_be_bytes()
                })
                .collect(),
            op => match RegisterSpace::from_read_opcode(op) {
                Some(space) => {
                    let mem = self.memory.entry(space).or_default();
                    (0..length as u16)
                        .map(|i| mem.get(&index.wrapping_add(i)).copied().unwrap_or(0xFF))
                        .collect()
                }
                None => vec![0; length],
            },
        }
    }

    fn apply_write(&mut self, value: u16, index: u16, data: &[u8]) {
        match value {
            OP_GEOMETRY_WRITE if data.len() >= 4 => self.geometry.copy_from_slice(&data[..4]),
            OP_INTEGRATION_WRITE if data.len() >= 2 => {
                self.integration_time = u16::from_be_bytes([data[0], data[1]])
            }
            OP_TRIGGER_PARAM_WRITE => self.trigger_params = data.to_vec(),
            OP_CAPTURE_MODE => self.capture_mode = index,
            OP_FPGA_WRITE => {
                for (i, pair) in data.chunks_exact(2).enumerate() {
                    let reg = index.wrapping_add(i as u16);
                    self.fpga.insert(reg, u16::from_be_bytes([pair[0], pair[1]]));
                }
            }
            op => {
                if let Some(space) = RegisterSpace::from_write_opcode(op) {
                    let mem = self.memory.entry(space).or_default();
                    for (i, b) in data.iter().enumerate() {
                        mem.insert(index.wrapping_add(i as u16), *b);
                    }
                }
            }
        }
    }
}

/// Scriptable GXS700 simulator.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockState>>,
    vid: u16,
    pid: u16,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState::default())),
            vid: GXS_VENDOR_ID,
            pid: GENDEX_SMALL_PID,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a reply for the next control read with opcode `op`.
    pub fn queue_read(&self, op: u16, reply: &[u8]) {
        self.lock()
            .read_queues
            .entry(op)
            .or_default()
            .push_back(reply.to_vec());
    }

    /// Queue a sequence of state register values.
    pub fn queue_states(&self, states: &[DeviceState]) {
        for s in states {
            self.queue_read(OP_STATE, &[s.as_byte()]);
        }
    }

    /// Queue a sequence of error register values.
    pub fn queue_errors(&self, codes: &[u8]) {
        for c in codes {
            self.queue_read(OP_ERROR, &[*c]);
        }
    }

    /// State reported once the state queue is empty.
    pub fn set_state(&self, state: DeviceState) {
        self.lock().state = state.as_byte();
    }

    /// Error code reported once the error queue is empty.
    pub fn set_error(&self, code: u8) {
        self.lock().error = code;
    }

    pub fn set_signature(&self, signature: u16) {
        self.lock().signature = signature;
    }

    pub fn set_versions(&self, reply: &[u8]) {
        self.lock().versions = reply.to_vec();
    }

    pub fn set_image_counter(&self, reply: &[u8]) {
        self.lock().image_counter = reply.to_vec();
    }

    /// Preload memory in a byte addressed space.
    pub fn load_memory(&self, space: RegisterSpace, addr: u16, data: &[u8]) {
        let mut st = self.lock();
        let mem = st.memory.entry(space).or_default();
        for (i, b) in data.iter().enumerate() {
            mem.insert(addr.wrapping_add(i as u16), *b);
        }
    }

    /// Read back memory in a byte addressed space (unwritten bytes are 0xFF).
    pub fn memory(&self, space: RegisterSpace, addr: u16, len: usize) -> Vec<u8> {
        let st = self.lock();
        let mem = st.memory.get(&space);
        (0..len as u16)
            .map(|i| {
                mem.and_then(|m| m.get(&addr.wrapping_add(i)).copied())
                    .unwrap_or(0xFF)
            })
            .collect()
    }

    pub fn set_fpga_register(&self, addr: u16, value: u16) {
        self.lock().fpga.insert(addr, value);
    }

    pub fn fpga_register(&self, addr: u16) -> Option<u16> {
        self.lock().fpga.get(&addr).copied()
    }

    /// Last geometry written with opcode 0x22, as `(width, height)`.
    pub fn geometry(&self) -> (u16, u16) {
        let g = self.lock().geometry;
        (
            u16::from_be_bytes([g[0], g[1]]),
            u16::from_be_bytes([g[2], g[3]]),
        )
    }

    pub fn integration_time(&self) -> u16 {
        self.lock().integration_time
    }

    pub fn capture_mode(&self) -> u16 {
        self.lock().capture_mode
    }

    /// Make the next write with opcode `op` report `written` bytes.
    pub fn inject_short_write(&self, op: u16, written: usize) {
        self.lock().short_writes.insert(op, written);
    }

    /// All control transfers so far.
    pub fn control_log(&self) -> Vec<ControlRecord> {
        self.lock().log.clone()
    }

    /// Control transfers with opcode `op`.
    pub fn transfers_with(&self, op: u16) -> Vec<ControlRecord> {
        self.lock()
            .log
            .iter()
            .filter(|r| r.value == op)
            .cloned()
            .collect()
    }

    /// Number of control transfers with opcode `op`.
    pub fn count(&self, op: u16) -> usize {
        self.lock().log.iter().filter(|r| r.value == op).count()
    }

    pub fn clear_log(&self) {
        self.lock().log.clear();
    }

    /// Queue one bulk completion.
    pub fn queue_bulk(&self, event: MockBulk) {
        self.lock().bulk_script.push_back(event);
    }

    /// Queue `data` as a bulk stream cut into `chunk` sized completions.
    ///
    /// A stream whose length is a multiple of `chunk` gets no terminating
    /// short packet.
    pub fn queue_bulk_stream(&self, data: &[u8], chunk: usize) {
        let mut st = self.lock();
        for piece in data.chunks(chunk.max(1)) {
            st.bulk_script.push_back(MockBulk::Data(piece.to_vec()));
        }
    }

    /// Scripted bulk completions not yet delivered.
    pub fn bulk_remaining(&self) -> usize {
        self.lock().bulk_script.len()
    }

    /// Total bulk submissions, resubmissions included.
    pub fn bulk_submitted(&self) -> usize {
        self.lock().bulk_submitted
    }

    /// Largest number of transfers outstanding at once.
    pub fn max_outstanding(&self) -> usize {
        self.lock().max_outstanding
    }

    /// Total transfers cancelled through `cancel_bulk`.
    pub fn bulk_cancelled(&self) -> usize {
        self.lock().bulk_cancelled
    }

    /// Simulate device disconnect.
    pub fn disconnect(&self) {
        self.lock().connected = false;
    }

    /// Simulate device reconnect.
    pub fn reconnect(&self) {
        self.lock().connected = true;
    }

    /// Set VID/PID reported by the transport.
    pub fn set_ids(&mut self, vid: u16, pid: u16) {
        self.vid = vid;
        self.pid = pid;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbTransport for MockTransport {
    fn control_read(
        &self,
        request: u8,
        value: u16,
        index: u16,
        length: usize,
    ) -> Result<Vec<u8>, TransportError> {
        let mut st = self.lock();
        if !st.connected {
            return Err(TransportError::Disconnected);
        }
        st.log.push(ControlRecord {
            direction: ControlDirection::In,
            request,
            value,
            index,
            length,
            data: Vec::new(),
        });
        if request != VENDOR_REQUEST {
            return Err(TransportError::ControlFailed {
                value,
                index,
                message: format!("unsupported bRequest 0x{:02X}", request),
            });
        }
        let mut reply = st.read_reply(value, index, length);
        reply.truncate(length);
        Ok(reply)
    }

    fn control_write(
        &self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize, TransportError> {
        let mut st = self.lock();
        if !st.connected {
            return Err(TransportError::Disconnected);
        }
        st.log.push(ControlRecord {
            direction: ControlDirection::Out,
            request,
            value,
            index,
            length: data.len(),
            data: data.to_vec(),
        });
        if request != VENDOR_REQUEST {
            return Err(TransportError::ControlFailed {
                value,
                index,
                message: format!("unsupported bRequest 0x{:02X}", request),
            });
        }
        if let Some(written) = st.short_writes.remove(&value) {
            return Ok(written);
        }
        st.apply_write(value, index, data);
        Ok(data.len())
    }

    fn submit_bulk(
        &mut self,
        endpoint: u8,
        id: TransferId,
        length: usize,
    ) -> Result<(), TransportError> {
        let mut st = self.lock();
        if !st.connected {
            return Err(TransportError::Disconnected);
        }
        if endpoint != BULK_IN_ENDPOINT {
            return Err(TransportError::BulkFailed {
                endpoint,
                message: "no such endpoint".into(),
            });
        }
        st.outstanding.push_back((id, length));
        st.bulk_submitted += 1;
        st.max_outstanding = st.max_outstanding.max(st.outstanding.len());
        Ok(())
    }

    fn handle_events(
        &mut self,
        timeout: Duration,
        handler: &mut dyn BulkHandler,
    ) -> Result<usize, TransportError> {
        let mut handled = 0;
        loop {
            // Take one completion, then release the lock while the handler runs.
            let next = {
                let mut st = self.lock();
                if !st.connected {
                    return Err(TransportError::Disconnected);
                }
                if st.outstanding.is_empty() || st.bulk_script.is_empty() {
                    None
                } else {
                    let transfer = st.outstanding.pop_front();
                    let event = st.bulk_script.pop_front();
                    transfer.zip(event)
                }
            };
            let Some(((id, requested), event)) = next else {
                break;
            };

            let payload;
            let status = match event {
                MockBulk::Data(mut bytes) => {
                    bytes.truncate(requested);
                    payload = bytes;
                    BulkStatus::Completed(&payload)
                }
                MockBulk::TimedOut => BulkStatus::TimedOut,
                MockBulk::Fail(message) => BulkStatus::Failed(message),
            };
            let disposition = handler.on_complete(BulkCompletion {
                id,
                requested,
                status,
            });
            handled += 1;

            if disposition == Disposition::Resubmit {
                let mut st = self.lock();
                st.outstanding.push_back((id, requested));
                st.bulk_submitted += 1;
                st.max_outstanding = st.max_outstanding.max(st.outstanding.len());
            }
        }

        if handled == 0 && self.pending_bulk() > 0 {
            // Nothing scripted: behave like a device that sends nothing.
            std::thread::sleep(timeout);
        }
        Ok(handled)
    }

    fn cancel_bulk(&mut self, endpoint: u8) -> Result<usize, TransportError> {
        if endpoint != BULK_IN_ENDPOINT {
            return Ok(0);
        }
        let mut st = self.lock();
        let cancelled = st.outstanding.len();
        st.outstanding.clear();
        st.bulk_cancelled += cancelled;
        Ok(cancelled)
    }

    fn pending_bulk(&self) -> usize {
        self.lock().outstanding.len()
    }

    fn vendor_id(&self) -> u16 {
        self.vid
    }

    fn product_id(&self) -> u16 {
        self.pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(mock: &MockTransport, op: u16, index: u16, data: &[u8]) -> usize {
        mock.control_write(VENDOR_REQUEST, op, index, data).unwrap()
    }

    fn read(mock: &MockTransport, op: u16, index: u16, length: usize) -> Vec<u8> {
        mock.control_read(VENDOR_REQUEST, op, index, length).unwrap()
    }

    struct Collect {
        seen: Vec<(TransferId, usize)>,
        resubmit: bool,
    }

    impl BulkHandler for Collect {
        fn on_complete(&mut self, completion: BulkCompletion<'_>) -> Disposition {
            let len = match completion.status {
                BulkStatus::Completed(data) => data.len(),
                _ => 0,
            };
            self.seen.push((completion.id, len));
            if self.resubmit {
                self.resubmit = false;
                Disposition::Resubmit
            } else {
                Disposition::Retire
            }
        }
    }

    #[test]
    fn test_mock_state_queue_then_sticky() {
        let mock = MockTransport::new();
        mock.queue_states(&[DeviceState::Transient1, DeviceState::CaptureReady]);

        assert_eq!(read(&mock, OP_STATE, 0, 1), vec![DeviceState::TRANSIENT1]);
        assert_eq!(read(&mock, OP_STATE, 0, 1), vec![DeviceState::CAPTURE_READY]);
        assert_eq!(read(&mock, OP_STATE, 0, 1), vec![DeviceState::IDLE]);
        assert_eq!(mock.count(OP_STATE), 3);
    }

    #[test]
    fn test_mock_memory_round_trip() {
        let mock = MockTransport::new();
        write(&mock, OP_EEPROM_WRITE, 0x20, b"abc");
        assert_eq!(read(&mock, OP_EEPROM_READ, 0x20, 4), vec![b'a', b'b', b'c', 0xFF]);
        assert_eq!(mock.memory(RegisterSpace::Eeprom, 0x21, 2), b"bc".to_vec());
    }

    #[test]
    fn test_mock_fpga_registers_are_words() {
        let mock = MockTransport::new();
        write(&mock, OP_FPGA_WRITE, 0x2002, &[0x00, 0x01, 0xAB, 0xCD]);
        assert_eq!(mock.fpga_register(0x2002), Some(1));
        assert_eq!(mock.fpga_register(0x2003), Some(0xABCD));
    }

    #[test]
    fn test_mock_short_write_is_one_shot() {
        let mock = MockTransport::new();
        mock.inject_short_write(OP_FLASH_WRITE, 3);
        assert_eq!(write(&mock, OP_FLASH_WRITE, 0, &[0; 8]), 3);
        assert_eq!(write(&mock, OP_FLASH_WRITE, 0, &[0; 8]), 8);
    }

    #[test]
    fn test_mock_bulk_delivery_and_resubmit() {
        let mut mock = MockTransport::new();
        mock.queue_bulk_stream(&[7u8; 10], 4);
        mock.submit_bulk(BULK_IN_ENDPOINT, TransferId(0), 4).unwrap();
        mock.submit_bulk(BULK_IN_ENDPOINT, TransferId(1), 4).unwrap();

        let mut h = Collect {
            seen: Vec::new(),
            resubmit: true,
        };
        let n = mock.handle_events(Duration::ZERO, &mut h).unwrap();
        assert_eq!(n, 3);
        assert_eq!(
            h.seen,
            vec![(TransferId(0), 4), (TransferId(1), 4), (TransferId(0), 2)]
        );
        assert_eq!(mock.bulk_submitted(), 3);
        assert_eq!(mock.max_outstanding(), 2);
        assert_eq!(mock.pending_bulk(), 0);
    }

    #[test]
    fn test_mock_cancel() {
        let mut mock = MockTransport::new();
        mock.submit_bulk(BULK_IN_ENDPOINT, TransferId(0), 4).unwrap();
        mock.submit_bulk(BULK_IN_ENDPOINT, TransferId(1), 4).unwrap();
        assert_eq!(mock.cancel_bulk(BULK_IN_ENDPOINT).unwrap(), 2);
        assert_eq!(mock.pending_bulk(), 0);
        assert_eq!(mock.bulk_cancelled(), 2);
    }

    #[test]
    fn test_mock_disconnect() {
        let mock = MockTransport::new();
        mock.disconnect();
        assert!(matches!(
            mock.control_read(VENDOR_REQUEST, OP_STATE, 0, 1),
            Err(TransportError::Disconnected)
        ));
        mock.reconnect();
        assert!(mock.control_read(VENDOR_REQUEST, OP_STATE, 0, 1).is_ok());
    }
}
