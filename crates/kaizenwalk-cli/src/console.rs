//! Terminal implementations of the core capability traits.
//!
//! Cues become a terminal bell plus a log line, notifications become log
//! lines, and the display sink keeps one status line updated in place.
//! Everything writes to stderr so stdout stays parseable JSON.

use std::io::Write;

use kaizenwalk_core::cue::{CueError, CueKind, CuePlayer, Notification, Notifier};
use kaizenwalk_core::display::{DisplaySink, Frame};
use kaizenwalk_core::schedule::{Phase, SetInfo};

fn ring_bell() {
    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(b"\x07");
    let _ = stderr.flush();
}

/// Cue player for live terminal sessions.
#[derive(Debug, Default)]
pub struct ConsoleCuePlayer;

impl CuePlayer for ConsoleCuePlayer {
    fn prime(&mut self) -> Result<(), CueError> {
        // No audio pipeline to warm up; a terminal session always starts.
        Ok(())
    }

    fn halt(&mut self) {}

    fn play_phase_cue(&mut self, phase: Phase, set: SetInfo) {
        ring_bell();
        tracing::info!(
            cue = ?CueKind::for_phase(phase),
            status = phase.status_text(),
            set = %set.display_text(),
            "phase cue"
        );
    }

    fn play_completion_cue(&mut self) {
        ring_bell();
        tracing::info!(cue = ?CueKind::Fanfare, "workout complete");
    }

    fn vibrate(&mut self, pattern: &[u32]) {
        tracing::debug!(?pattern, "vibration (no haptics on this terminal)");
    }

    fn notify(&mut self, notification: &Notification) {
        tracing::info!(
            title = %notification.title,
            body = %notification.body,
            tag = %notification.tag,
            "notification"
        );
    }
}

/// Notifier handed to the background worker.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notification: &Notification) {
        ring_bell();
        tracing::info!(
            title = %notification.title,
            body = %notification.body,
            tag = %notification.tag,
            "background notification"
        );
    }
}

/// Single status line, rewritten in place on every frame.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl DisplaySink for ConsoleSink {
    fn present(&mut self, frame: &Frame) {
        let mut stderr = std::io::stderr();
        let line = if frame.set_line.is_empty() {
            format!("\r{:<14} {:>6}                                  ", frame.status, frame.clock)
        } else {
            format!(
                "\r{:<14} {:>6}  {}      ",
                frame.status, frame.clock, frame.set_line
            )
        };
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}
