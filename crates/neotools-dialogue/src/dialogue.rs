use std::thread::sleep;

use neotools_protocol::{assert_success, Message, OpCode};
use neotools_transport::RawIo;
use tracing::{debug, info, warn};

use crate::constants::*;
use crate::Error;

/// Owns one ASM dialogue session: the hello/reset/switch-applet bracket that
/// must open every exchange with the device, and the matching closing
/// reset that must run even if the caller bails out early.
///
/// Generic over [`RawIo`] rather than pinned to [`neotools_transport::Transport`]
/// so the block-transfer and handshake logic can be driven by a mock in tests.
///
/// `close` is the intended way to end a session — it can fail, and
/// propagating that failure matters. `Drop` is a safety net for the early-
/// return case: it logs and makes a best-effort reset, but can't surface
/// an error.
pub struct Dialogue<'t, T: RawIo> {
    transport: &'t T,
    closed: bool,
}

impl<'t, T: RawIo> Dialogue<'t, T> {
    /// Runs hello, reset, and switch-applet against `applet_id`, returning a
    /// guard that owns the remainder of the session.
    pub fn start(transport: &'t T, applet_id: u16) -> Result<Self, Error> {
        hello(transport)?;
        reset(transport)?;
        switch_applet(transport, applet_id)?;
        Ok(Dialogue { transport, closed: false })
    }

    /// Ends the session with the closing reset, consuming the guard.
    pub fn close(mut self) -> Result<(), Error> {
        reset(self.transport)?;
        self.closed = true;
        Ok(())
    }

    /// Sends `message` and reads the 8-byte response, optionally asserting
    /// its opcode matches `expected`.
    pub fn send(&self, message: &Message, expected: Option<OpCode>) -> Result<Message, Error> {
        self.send_with_timeout(message, expected, neotools_transport::DEFAULT_TIMEOUT, neotools_transport::DEFAULT_TIMEOUT)
    }

    /// Like [`send`](Self::send) with independent write/read timeouts, for
    /// operations the device can take much longer than usual to answer
    /// (applet programming block acks, finalize-writing-applet).
    pub fn send_with_timeout(
        &self,
        message: &Message,
        expected: Option<OpCode>,
        write_timeout: std::time::Duration,
        read_timeout: std::time::Duration,
    ) -> Result<Message, Error> {
        self.transport.write(message.as_bytes(), write_timeout)?;
        let response = self.receive_with_timeout(read_timeout)?;
        if let Some(expected) = expected {
            assert_success(&response, expected)?;
        }
        Ok(response)
    }

    /// Writes raw bytes (not a framed [`Message`]) at a caller-chosen
    /// timeout, e.g. streaming an applet's binary content.
    pub fn write_raw(&self, data: &[u8], timeout: std::time::Duration) -> Result<(), Error> {
        Ok(self.transport.write(data, timeout)?)
    }

    /// Reads one raw 8-byte response frame at a caller-chosen timeout.
    pub fn receive_with_timeout(&self, timeout: std::time::Duration) -> Result<Message, Error> {
        let buf = self.transport.read(8, timeout)?;
        let mut frame = [0u8; 8];
        frame[..buf.len().min(8)].copy_from_slice(&buf[..buf.len().min(8)]);
        Ok(Message::from_raw(frame))
    }

    /// Reads `length` bytes directly off the transport at a caller-chosen
    /// timeout, for responses that carry a payload directly rather than
    /// through the block-read loop (applet header batches, file
    /// attributes, settings blobs).
    pub fn read_raw(&self, length: usize, timeout: std::time::Duration) -> Result<Vec<u8>, Error> {
        Ok(self.transport.read(length, timeout)?)
    }

    /// Reads one raw 8-byte response frame without sending anything first.
    pub fn receive(&self) -> Result<Message, Error> {
        self.receive_with_timeout(neotools_transport::DEFAULT_TIMEOUT)
    }

    /// Runs the block-read loop: repeatedly issues `RequestBlockRead` until
    /// the device replies `ResponseBlockReadEmpty` or `size` bytes have been
    /// collected, verifying each block's 16-bit checksum.
    pub fn read_extended_data(&self, size: usize) -> Result<Vec<u8>, Error> {
        debug!(size, "reading extended data");
        let mut remaining = size;
        let mut result = Vec::with_capacity(size);
        while remaining > 0 {
            let request = Message::new(OpCode::RequestBlockRead, &[])?;
            let response = self.send(&request, None)?;
            match response.opcode() {
                OpCode::ResponseBlockReadEmpty => break,
                OpCode::ResponseBlockRead => {
                    let block_size = response.argument(1, 4)? as usize;
                    let expected_checksum = response.argument(5, 2)? as u16;
                    let buf = self
                        .transport
                        .read(block_size, extended_read_timeout(block_size))?;
                    let got_checksum = neotools_core::checksum16(&buf);
                    if got_checksum != expected_checksum {
                        return Err(Error::ChecksumMismatch {
                            expected: expected_checksum,
                            got: got_checksum,
                        });
                    }
                    remaining = remaining.saturating_sub(buf.len());
                    result.extend(buf);
                }
                other => {
                    return Err(Error::Protocol(neotools_protocol::Error::UnexpectedResponse {
                        expected: OpCode::ResponseBlockRead,
                        got: other,
                        frame: *response.as_bytes(),
                    }))
                }
            }
        }
        Ok(result)
    }

    /// Runs the block-write loop: splits `buf` into chunks of at most
    /// [`BLOCK_WRITE_CHUNK_SIZE`] bytes, each preceded by a checksummed
    /// `RequestBlockWrite` and followed by a `ResponseBlockWriteDone` ack.
    pub fn write_extended_data(&self, buf: &[u8]) -> Result<(), Error> {
        debug!(len = buf.len(), "writing extended data");
        let mut offset = 0;
        while offset < buf.len() {
            let chunk_len = (buf.len() - offset).min(BLOCK_WRITE_CHUNK_SIZE);
            let chunk = &buf[offset..offset + chunk_len];
            let checksum = neotools_core::checksum16(chunk);

            let request = Message::new(
                OpCode::RequestBlockWrite,
                &[(chunk_len as u32, 1, 4), (checksum as u32, 5, 2)],
            )?;
            self.send(&request, Some(OpCode::ResponseBlockWrite))?;

            self.transport.write(chunk, neotools_transport::DEFAULT_TIMEOUT)?;
            let done = self.receive()?;
            assert_success(&done, OpCode::ResponseBlockWriteDone)?;

            offset += chunk_len;
        }
        Ok(())
    }
}

impl<T: RawIo> Drop for Dialogue<'_, T> {
    fn drop(&mut self) {
        if !self.closed {
            warn!("dialogue guard dropped without close(), sending best-effort reset");
            let _ = reset(self.transport);
        }
    }
}

fn reset(transport: &impl RawIo) -> Result<(), Error> {
    transport.write(&RESET_COMMAND, neotools_transport::DEFAULT_TIMEOUT)?;
    Ok(())
}

fn switch_applet(transport: &impl RawIo, applet_id: u16) -> Result<(), Error> {
    let id_bytes = applet_id.to_be_bytes();
    let command = [b'?', b'S', b'w', b't', b'c', b'h', id_bytes[0], id_bytes[1]];
    transport.write(&command, neotools_transport::DEFAULT_TIMEOUT)?;
    let response = transport.read(8, neotools_transport::DEFAULT_TIMEOUT)?;
    if response != b"Switched" {
        return Err(Error::SwitchAppletFailed { applet_id });
    }
    Ok(())
}

fn hello(transport: &impl RawIo) -> Result<(), Error> {
    info!("pinging device for ASM protocol version");
    let mut version = None;
    for attempt in 0..HELLO_RETRIES {
        transport.write(&[0x01], HELLO_TIMEOUT)?;
        let buf = transport.read(8, HELLO_TIMEOUT)?;
        if buf.len() == 2 {
            version = Some(u16::from_be_bytes([buf[0], buf[1]]));
            break;
        }
        debug!(attempt, ?buf, "unexpected hello response");
        reset(transport)?;
        sleep(HELLO_BACKOFF);
    }

    let version = version.ok_or(Error::HelloFailed)?;
    if version < PROTOCOL_VERSION {
        return Err(Error::UnsupportedProtocolVersion {
            found: version,
            required: PROTOCOL_VERSION,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    use super::*;

    /// A scripted [`RawIo`]: `reads` is drained in order regardless of the
    /// requested length (our frames are always fixed-size), and every write
    /// is appended to `writes` for assertions.
    struct MockTransport {
        reads: RefCell<VecDeque<Vec<u8>>>,
        writes: RefCell<Vec<Vec<u8>>>,
    }

    impl MockTransport {
        fn new(reads: Vec<Vec<u8>>) -> Self {
            MockTransport {
                reads: RefCell::new(reads.into()),
                writes: RefCell::new(Vec::new()),
            }
        }
    }

    impl RawIo for MockTransport {
        fn read(&self, _length: usize, _timeout: Duration) -> Result<Vec<u8>, neotools_transport::Error> {
            Ok(self.reads.borrow_mut().pop_front().unwrap_or_default())
        }

        fn write(&self, data: &[u8], _timeout: Duration) -> Result<(), neotools_transport::Error> {
            self.writes.borrow_mut().push(data.to_vec());
            Ok(())
        }
    }

    fn hello_ok_response() -> Vec<u8> {
        PROTOCOL_VERSION.to_be_bytes().to_vec()
    }

    #[test]
    fn start_runs_hello_reset_switch_applet_in_order() {
        let mock = MockTransport::new(vec![hello_ok_response(), b"Switched".to_vec()]);
        let dialogue = Dialogue::start(&mock, neotools_protocol::applet_id::SYSTEM).unwrap();
        dialogue.close().unwrap();

        let writes = mock.writes.borrow();
        assert_eq!(writes[0], vec![0x01]); // hello ping
        assert_eq!(writes[1].as_slice(), &RESET_COMMAND); // opening reset
        assert_eq!(&writes[2][..6], b"?Swtch");
        assert_eq!(writes.last().unwrap().as_slice(), &RESET_COMMAND); // closing reset
    }

    #[test]
    fn hello_retries_until_two_byte_response_then_succeeds() {
        let mock = MockTransport::new(vec![
            vec![0u8; 8], // garbage full frame, doesn't count as success
            hello_ok_response(),
            b"Switched".to_vec(),
        ]);
        assert!(Dialogue::start(&mock, neotools_protocol::applet_id::SYSTEM).is_ok());
    }

    #[test]
    fn hello_fails_after_exhausting_retries() {
        let reads = std::iter::repeat(vec![0u8; 8])
            .take((HELLO_RETRIES as usize) * 2)
            .collect();
        let mock = MockTransport::new(reads);
        let err = Dialogue::start(&mock, neotools_protocol::applet_id::SYSTEM).unwrap_err();
        assert!(matches!(err, Error::HelloFailed));
    }

    #[test]
    fn rejects_protocol_version_below_minimum() {
        let mock = MockTransport::new(vec![0x01u16.to_be_bytes().to_vec()]);
        let err = Dialogue::start(&mock, neotools_protocol::applet_id::SYSTEM).unwrap_err();
        assert!(matches!(err, Error::UnsupportedProtocolVersion { .. }));
    }

    #[test]
    fn switch_applet_failure_is_reported() {
        let mock = MockTransport::new(vec![hello_ok_response(), b"NopeNope".to_vec()]);
        let err = Dialogue::start(&mock, neotools_protocol::applet_id::ALPHAWORD).unwrap_err();
        assert!(matches!(err, Error::SwitchAppletFailed { applet_id } if applet_id == neotools_protocol::applet_id::ALPHAWORD));
    }

    #[test]
    fn closing_reset_runs_even_when_caller_returns_early_via_drop() {
        let mock = MockTransport::new(vec![hello_ok_response(), b"Switched".to_vec()]);
        {
            let _dialogue = Dialogue::start(&mock, neotools_protocol::applet_id::SYSTEM).unwrap();
            // Caller bails out without calling close() — e.g. an early `?` return.
        }
        assert_eq!(mock.writes.borrow().last().unwrap().as_slice(), &RESET_COMMAND);
    }

    #[test]
    fn read_extended_data_collects_blocks_until_empty() {
        let mock = MockTransport::new(vec![
            hello_ok_response(),
            b"Switched".to_vec(),
            Message::new(OpCode::ResponseBlockRead, &[(4, 1, 4), (neotools_core::checksum16(&[1, 2, 3, 4]) as u32, 5, 2)])
                .unwrap()
                .as_bytes()
                .to_vec(),
            vec![1, 2, 3, 4],
            Message::new(OpCode::ResponseBlockReadEmpty, &[]).unwrap().as_bytes().to_vec(),
        ]);
        let dialogue = Dialogue::start(&mock, neotools_protocol::applet_id::SYSTEM).unwrap();
        let data = dialogue.read_extended_data(4).unwrap();
        assert_eq!(data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn read_extended_data_rejects_checksum_mismatch() {
        let mock = MockTransport::new(vec![
            hello_ok_response(),
            b"Switched".to_vec(),
            Message::new(OpCode::ResponseBlockRead, &[(4, 1, 4), (0xdead_u32, 5, 2)])
                .unwrap()
                .as_bytes()
                .to_vec(),
            vec![1, 2, 3, 4],
        ]);
        let dialogue = Dialogue::start(&mock, neotools_protocol::applet_id::SYSTEM).unwrap();
        let err = dialogue.read_extended_data(4).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));
    }

    #[test]
    fn write_extended_data_chunks_at_block_write_size() {
        let payload = vec![0xABu8; BLOCK_WRITE_CHUNK_SIZE + 10];
        let mock = MockTransport::new(vec![
            hello_ok_response(),
            b"Switched".to_vec(),
            Message::new(OpCode::ResponseBlockWrite, &[]).unwrap().as_bytes().to_vec(),
            Message::new(OpCode::ResponseBlockWriteDone, &[]).unwrap().as_bytes().to_vec(),
            Message::new(OpCode::ResponseBlockWrite, &[]).unwrap().as_bytes().to_vec(),
            Message::new(OpCode::ResponseBlockWriteDone, &[]).unwrap().as_bytes().to_vec(),
        ]);
        let dialogue = Dialogue::start(&mock, neotools_protocol::applet_id::SYSTEM).unwrap();
        dialogue.write_extended_data(&payload).unwrap();

        let writes = mock.writes.borrow();
        // hello ping, opening reset, switch-applet, request, chunk 1, request, chunk 2
        let chunk_writes: Vec<_> = writes.iter().filter(|w| w.len() == BLOCK_WRITE_CHUNK_SIZE || w.len() == 10).collect();
        assert_eq!(chunk_writes.len(), 2);
        assert_eq!(chunk_writes[0].len(), BLOCK_WRITE_CHUNK_SIZE);
        assert_eq!(chunk_writes[1].len(), 10);
    }
}
