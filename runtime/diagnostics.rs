/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Channel-tagged diagnostics events.
//!
//! Embedders install a sender once at startup; every registry, privilege, and
//! dispatch path then reports outcomes on its `registry.*` channel. Without an
//! installed sender emission is a no-op.

use std::sync::OnceLock;

use crossbeam_channel::Sender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    MessageSent {
        channel_id: &'static str,
        byte_len: usize,
    },
    MessageReceived {
        channel_id: &'static str,
        latency_us: u64,
    },
}

impl DiagnosticEvent {
    pub fn channel_id(&self) -> &'static str {
        match self {
            Self::MessageSent { channel_id, .. } | Self::MessageReceived { channel_id, .. } => {
                channel_id
            }
        }
    }
}

static GLOBAL_DIAGNOSTICS_TX: OnceLock<Sender<DiagnosticEvent>> = OnceLock::new();

#[cfg(test)]
thread_local! {
    static TEST_DIAGNOSTICS_TX: std::cell::RefCell<Option<Sender<DiagnosticEvent>>> =
        const { std::cell::RefCell::new(None) };
}

/// Install the process-wide diagnostics sender. Later installs are ignored.
pub fn install_global_sender(sender: Sender<DiagnosticEvent>) {
    let _ = GLOBAL_DIAGNOSTICS_TX.set(sender.clone());

    #[cfg(test)]
    {
        TEST_DIAGNOSTICS_TX.with(|slot| {
            *slot.borrow_mut() = Some(sender);
        });
    }
}

#[cfg(test)]
pub(crate) fn install_test_sender(sender: Sender<DiagnosticEvent>) {
    TEST_DIAGNOSTICS_TX.with(|slot| {
        *slot.borrow_mut() = Some(sender);
    });
}

pub(crate) fn emit_event(event: DiagnosticEvent) {
    #[cfg(test)]
    {
        let mut handled = false;
        TEST_DIAGNOSTICS_TX.with(|slot| {
            if let Some(tx) = slot.borrow().as_ref() {
                let _ = tx.send(event.clone());
                handled = true;
            }
        });
        if handled {
            return;
        }
    }

    if let Some(tx) = GLOBAL_DIAGNOSTICS_TX.get() {
        let _ = tx.send(event);
    }
}
