use std::sync::OnceLock;

use crossbeam_channel::Receiver;
use schemeshell::{DiagnosticEvent, VERSION, install_global_sender};

mod dispatch;
mod registration;

/// Shared diagnostics tap for the scenario binary. Installed once; only the
/// registration scenario drains it, so channel counts are not contended
/// across tests.
fn diagnostics() -> &'static Receiver<DiagnosticEvent> {
    static RX: OnceLock<Receiver<DiagnosticEvent>> = OnceLock::new();
    RX.get_or_init(|| {
        let (tx, rx) = crossbeam_channel::unbounded();
        install_global_sender(tx);
        rx
    })
}

#[test]
fn scenarios_binary_smoke_runs() {
    assert!(!VERSION.is_empty());
}
