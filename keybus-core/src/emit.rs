//! Key emission trait and error types.

use core::future::Future;

use crate::keymap::KeyCode;
use crate::report::{KeyboardReport, REPORT_LEN};

/// Error type for key emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EmitError {
    /// USB/communication I/O error.
    Io,
    /// Device not ready (e.g., USB not enumerated).
    NotReady,
    /// Six keys already held.
    RolloverFull,
}

/// Async trait for key-down/key-up sinks.
///
/// This abstracts the host-facing side of the aggregator so the poller
/// can be tested without USB.
pub trait KeyEmitter {
    /// Report `key` as pressed.
    fn key_down(&mut self, key: KeyCode) -> impl Future<Output = Result<(), EmitError>>;

    /// Report `key` as released.
    fn key_up(&mut self, key: KeyCode) -> impl Future<Output = Result<(), EmitError>>;

    /// Release every held key.
    fn release_all(&mut self) -> impl Future<Output = Result<(), EmitError>>;

    /// Whether any key is currently reported as held.
    fn any_held(&self) -> bool;

    /// Check if the emitter can currently deliver keys.
    fn is_ready(&self) -> bool;

    /// Wait until the emitter can deliver keys again.
    fn wait_ready(&mut self) -> impl Future<Output = ()>;
}

/// Destination for serialized boot keyboard reports.
pub trait ReportWriter {
    /// Send one report. May wait until the previous one was taken.
    fn write_report(
        &mut self,
        report: &[u8; REPORT_LEN],
    ) -> impl Future<Output = Result<(), EmitError>>;

    fn is_ready(&self) -> bool;

    /// Resolve once the host side accepts reports again (e.g. after a bus reset).
    fn wait_ready(&mut self) -> impl Future<Output = ()>;
}

/// [`KeyEmitter`] that keeps a [`KeyboardReport`] and sends it on every change.
pub struct ReportEmitter<W> {
    writer: W,
    report: KeyboardReport,
}

impl<W: ReportWriter> ReportEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            report: KeyboardReport::new(),
        }
    }

    /// Keys currently reported as held.
    pub fn report(&self) -> &KeyboardReport {
        &self.report
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: ReportWriter> KeyEmitter for ReportEmitter<W> {
    async fn key_down(&mut self, key: KeyCode) -> Result<(), EmitError> {
        if self.report.press(key)? {
            self.writer.write_report(&self.report.as_bytes()).await?;
        }
        Ok(())
    }

    async fn key_up(&mut self, key: KeyCode) -> Result<(), EmitError> {
        if self.report.release(key) {
            self.writer.write_report(&self.report.as_bytes()).await?;
        }
        Ok(())
    }

    /// Clears the report and sends it empty.
    async fn release_all(&mut self) -> Result<(), EmitError> {
        self.report.clear();
        self.writer.write_report(&self.report.as_bytes()).await
    }

    fn any_held(&self) -> bool {
        !self.report.is_empty()
    }

    fn is_ready(&self) -> bool {
        self.writer.is_ready()
    }

    async fn wait_ready(&mut self) {
        self.writer.wait_ready().await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    extern crate std;

    use super::*;
    use core::future::Future;
    use core::pin::Pin;
    use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
    use std::vec::Vec;

    // Helper to run a future to completion (simple blocking executor)
    pub(crate) fn block_on<F: Future>(mut f: F) -> F::Output {
        fn noop_raw_waker() -> RawWaker {
            fn noop(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                noop_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
            RawWaker::new(core::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
        let mut cx = Context::from_waker(&waker);

        // SAFETY: We don't move f after pinning
        let mut f = unsafe { Pin::new_unchecked(&mut f) };

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(result) => return result,
                Poll::Pending => {
                    panic!("Mock future returned Pending unexpectedly");
                }
            }
        }
    }

    // Records every report; `fail` stands in for a detached host
    pub(crate) struct MockWriter {
        pub(crate) sent: Vec<[u8; REPORT_LEN]>,
        pub(crate) fail: bool,
    }

    impl MockWriter {
        pub(crate) fn new() -> Self {
            Self {
                sent: Vec::new(),
                fail: false,
            }
        }
    }

    impl ReportWriter for MockWriter {
        fn write_report(
            &mut self,
            report: &[u8; REPORT_LEN],
        ) -> impl Future<Output = Result<(), EmitError>> {
            let result = if self.fail {
                Err(EmitError::Io)
            } else {
                self.sent.push(*report);
                Ok(())
            };
            core::future::ready(result)
        }

        fn is_ready(&self) -> bool {
            !self.fail
        }

        fn wait_ready(&mut self) -> impl Future<Output = ()> {
            self.fail = false;
            core::future::ready(())
        }
    }

    #[test]
    fn test_key_down_up_sends_reports() {
        let mut emitter = ReportEmitter::new(MockWriter::new());

        block_on(emitter.key_down(KeyCode::F13)).unwrap();
        block_on(emitter.key_up(KeyCode::F13)).unwrap();

        let sent = &emitter.writer().sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], [0, 0, 0x68, 0, 0, 0, 0, 0]);
        assert_eq!(sent[1], [0; REPORT_LEN]);
    }

    #[test]
    fn test_unchanged_report_is_not_sent() {
        let mut emitter = ReportEmitter::new(MockWriter::new());

        block_on(emitter.key_up(KeyCode::A)).unwrap();
        block_on(emitter.key_down(KeyCode::A)).unwrap();
        block_on(emitter.key_down(KeyCode::A)).unwrap();

        assert_eq!(emitter.writer().sent.len(), 1);
    }

    #[test]
    fn test_rollover_full_is_reported() {
        let mut emitter = ReportEmitter::new(MockWriter::new());
        for usage in 0x04..0x0A {
            block_on(emitter.key_down(KeyCode(usage))).unwrap();
        }
        assert_eq!(
            block_on(emitter.key_down(KeyCode::SPACE)),
            Err(EmitError::RolloverFull)
        );
        assert_eq!(emitter.writer().sent.len(), 6);
    }

    #[test]
    fn test_writer_error_propagates() {
        let mut emitter = ReportEmitter::new(MockWriter::new());
        emitter.writer_mut().fail = true;
        assert!(!emitter.is_ready());
        assert_eq!(block_on(emitter.key_down(KeyCode::B)), Err(EmitError::Io));

        block_on(emitter.wait_ready());
        assert!(emitter.is_ready());
        block_on(emitter.key_down(KeyCode::C)).unwrap();
        assert_eq!(emitter.writer().sent.len(), 1);
    }

    #[test]
    fn test_release_all() {
        let mut emitter = ReportEmitter::new(MockWriter::new());
        block_on(emitter.key_down(KeyCode::LEFT_SHIFT)).unwrap();
        block_on(emitter.key_down(KeyCode::X)).unwrap();
        assert!(emitter.any_held());
        block_on(emitter.release_all()).unwrap();

        assert!(!emitter.any_held());
        assert!(emitter.report().is_empty());
        let writer = emitter.into_inner();
        assert_eq!(writer.sent.last(), Some(&[0; REPORT_LEN]));
    }
}
