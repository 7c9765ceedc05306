#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Gating of the diagnostics channels, as seen by a `tracing` subscriber

use std::io;
use std::sync::{Arc, Mutex};

use eink_fb::devices::{kobo, lookup};
use eink_fb::{Diagnostics, FbConfig, RefreshRequest, WaveformMode};
use eink_testing::{SimConfig, TestHarness};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::SubscriberInitExt;

/// Formatted log lines, shared with the subscriber
#[derive(Debug, Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run an Aura One session with `diag`: init, then a refresh with a waveform the NTX driver
/// lacks (warning) and a completion wait. Returns everything logged.
fn session_log(diag: Diagnostics) -> String {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(LevelFilter::TRACE)
        .with_ansi(false)
        .finish();
    let _guard = subscriber.set_default();

    let config = FbConfig {
        verbose: diag.verbose,
        quiet: diag.quiet,
        ..FbConfig::default()
    };
    let aura_one = lookup(kobo::KOBO_MODELS, 373).unwrap();
    let mut t = TestHarness::with_config(SimConfig::new(1080, 1440, 8), aura_one, config).unwrap();
    let marker = t
        .refresh(&RefreshRequest::full_screen().waveform(WaveformMode::Gc16Fast))
        .unwrap();
    t.wait_for_completion(marker).unwrap();

    capture.text()
}

const NOTICE: &str = "Framebuffer is 1080x1440";
const WARNING: &str = "is not supported on";
const DETAIL: &str = "MXCFB_SEND_UPDATE marker";

#[test]
fn test_quiet_keeps_warnings_only() {
    let log = session_log(Diagnostics::QUIET);
    assert!(!log.contains(NOTICE), "{log}");
    assert!(!log.contains(DETAIL), "{log}");
    assert!(log.contains(WARNING), "{log}");
    assert!(log.contains("WARN"), "{log}");
}

#[test]
fn test_default_shows_notices_without_detail() {
    let log = session_log(Diagnostics::default());
    assert!(log.contains(NOTICE), "{log}");
    assert!(log.contains(WARNING), "{log}");
    assert!(!log.contains(DETAIL), "{log}");
    assert!(!log.contains("completed after"), "{log}");
}

#[test]
fn test_verbose_shows_detail() {
    let log = session_log(Diagnostics::VERBOSE);
    assert!(log.contains(NOTICE), "{log}");
    assert!(log.contains(DETAIL), "{log}");
    assert!(log.contains("completed after"), "{log}");
    assert!(log.contains("DEBUG"), "{log}");
}
