//! Phase-tagged output for integration tests.
//!
//! Lines go to stderr so they show up with `--nocapture` and stay out of the
//! way otherwise. Set `TEST_LOG_QUIET=1` to silence them.

use std::sync::Mutex;
use std::time::Instant;

use super::log_capture::TestLogCapture;

pub struct TestLogger {
    test_name: String,
    start_time: Instant,
    phase: Mutex<String>,
    quiet: bool,
}

impl TestLogger {
    #[must_use]
    pub fn new(test_name: &str) -> Self {
        let logger = Self {
            test_name: test_name.to_string(),
            start_time: Instant::now(),
            phase: Mutex::new("init".to_string()),
            quiet: std::env::var("TEST_LOG_QUIET").is_ok_and(|v| v == "1" || v == "true"),
        };
        logger.line("INFO", "Test starting");
        logger
    }

    /// Logger plus a tracing capture scoped to the current thread.
    pub fn with_capture(test_name: &str) -> (Self, TestLogCapture) {
        let capture = TestLogCapture::start();
        (Self::new(test_name), capture)
    }

    pub fn phase(&self, phase: &str) {
        if let Ok(mut current) = self.phase.lock() {
            *current = phase.to_string();
        }
        self.line("DEBUG", &format!("Phase: {phase}"));
    }

    pub fn info(&self, message: &str) {
        self.line("INFO", message);
    }

    pub fn finish_ok(&self) {
        let ms = self.start_time.elapsed().as_millis();
        self.line("INFO", &format!("Test passed (duration: {ms}ms)"));
    }

    fn line(&self, level: &str, message: &str) {
        if self.quiet {
            return;
        }
        let phase = self
            .phase
            .lock()
            .map(|p| p.clone())
            .unwrap_or_else(|_| "?".to_string());
        eprintln!("[{level:5}] {}::{phase} {message}", self.test_name);
    }
}
