//! Ctrl-C handling.
//!
//! The first Ctrl-C marks the shared [`CancelToken`]; work that runs in steps
//! polls it and unwinds with [`DocuchatError::Interrupted`]. A Ctrl-C that
//! arrives while a [`BlockingSection`] is open (a PDF extraction or an HTTP
//! request that cannot poll) resets the terminal and exits immediately, as does
//! a second Ctrl-C.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::error::{DocuchatError, Result};

const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    blocking: Arc<AtomicUsize>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Mark a call that cannot poll the token until the guard is dropped.
    pub fn blocking(&self) -> BlockingSection {
        self.blocking.fetch_add(1, Ordering::SeqCst);
        BlockingSection {
            counter: self.blocking.clone(),
        }
    }

    pub fn in_blocking_call(&self) -> bool {
        self.blocking.load(Ordering::SeqCst) > 0
    }

    /// Whether an interrupt arriving now should end the process at once.
    fn should_exit_on_interrupt(&self) -> bool {
        self.is_cancelled() || self.in_blocking_call()
    }

    /// Err(Interrupted) once the token has been cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(DocuchatError::Interrupted)
        } else {
            Ok(())
        }
    }
}

pub struct BlockingSection {
    counter: Arc<AtomicUsize>,
}

impl Drop for BlockingSection {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn install_handler(token: CancelToken) -> Result<()> {
    ctrlc::set_handler(move || {
        if token.should_exit_on_interrupt() {
            reset_terminal();
            std::process::exit(0);
        }
        tracing::debug!("interrupt received");
        token.cancel();
    })
    .map_err(|e| DocuchatError::Io(io::Error::new(io::ErrorKind::Other, e)))
}

/// Clear any text formatting and restore the cursor.
pub fn reset_terminal() {
    let _ = console::Term::stdout().show_cursor();
    let mut stdout = io::stdout();
    let _ = writeln!(stdout, "{}", RESET);
    let _ = stdout.flush();
}
