// src/test_support.rs
use std::{
    io,
    sync::{Mutex, Once},
};
use tracing_subscriber::{
    fmt::{self, writer::MakeWriterExt, TestWriter},
    EnvFilter,
};

static LOGS: Mutex<Vec<u8>> = Mutex::new(Vec::new());
static INIT: Once = Once::new();

struct LogBuffer;

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut logs) = LOGS.lock() {
            logs.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Install one global subscriber for the test binary. Global, not
/// thread-local, so events from the blocking pool are captured too.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(EnvFilter::new("info"))
            .with_ansi(false)
            .with_writer((|| LogBuffer).and(TestWriter::new()))
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Every line logged so far by any test in this binary.
pub fn captured_lines() -> Vec<String> {
    let logs = LOGS.lock().map(|l| l.clone()).unwrap_or_default();
    String::from_utf8_lossy(&logs)
        .lines()
        .map(str::to_string)
        .collect()
}
