pub mod routing_tests;

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use tether_server::{Relay, RelayCommand};

use crate::utils::{MockSignalingOutput, Outbound};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A relay driven by direct method calls. The command channel is never fed.
pub fn create_test_relay() -> (Relay, MockSignalingOutput) {
    let (_cmd_tx, cmd_rx) = mpsc::channel::<RelayCommand>(1);
    let signaling = MockSignalingOutput::new_stored_only();
    let relay = Relay::new(cmd_rx, Arc::new(signaling.clone()));
    (relay, signaling)
}

/// A relay running its own event loop, fed through the command channel.
pub fn spawn_test_relay() -> (
    mpsc::Sender<RelayCommand>,
    mpsc::UnboundedReceiver<Outbound>,
    MockSignalingOutput,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<RelayCommand>(100);
    let (signaling, signal_rx) = MockSignalingOutput::new();
    let relay = Relay::new(cmd_rx, Arc::new(signaling.clone()));

    tokio::spawn(async move {
        relay.run().await;
    });

    (cmd_tx, signal_rx, signaling)
}
