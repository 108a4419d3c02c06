// src/signals.rs

//! Termination-signal handling.
//!
//! SIGTERM and SIGINT are handled identically: the first one received turns
//! into a [`RunEvent::ShutdownRequested`] that the runtime converts into a
//! run-wide abort. After the abort has fanned the signal out to the child
//! process groups and the marker files are gone, the engine re-raises the
//! signal against itself with the default disposition restored, so its exit
//! status reports death by that signal rather than an ordinary exit code.

use nix::sys::signal::{self as nix_signal, SigHandler, Signal};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::info;

use crate::engine::{AbortSignal, RunEvent};
use crate::errors::Result;

/// Spawn the listener that converts SIGTERM / SIGINT into a shutdown event.
///
/// Only the first signal matters to the engine; the runtime ignores
/// repeats.
pub fn spawn_signal_listener(runtime_tx: mpsc::Sender<RunEvent>) -> Result<()> {
    let mut term = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        let received = tokio::select! {
            _ = term.recv() => AbortSignal::Term,
            _ = interrupt.recv() => AbortSignal::Int,
        };
        info!(signal = received.name(), "termination signal received");
        let _ = runtime_tx
            .send(RunEvent::ShutdownRequested { signal: received })
            .await;
    });

    Ok(())
}

/// OS signal corresponding to an [`AbortSignal`].
pub fn os_signal(sig: AbortSignal) -> Signal {
    match sig {
        AbortSignal::Term => Signal::SIGTERM,
        AbortSignal::Int => Signal::SIGINT,
    }
}

/// Die by the given signal.
///
/// Restores the default disposition first; the handler installed by the
/// listener above would otherwise swallow the re-raise.
pub fn exit_by_signal(sig: AbortSignal) -> ! {
    let signo = os_signal(sig);
    unsafe {
        let _ = nix_signal::signal(signo, SigHandler::SigDfl);
    }
    let _ = nix_signal::raise(signo);

    // Unreachable unless the raise itself failed; fall back to the shell
    // convention for signal deaths.
    std::process::exit(128 + signo as i32)
}
