use duet_core::ServerEvent;
use duet_room::{RoomCommand, RoomError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{ConnectBehavior, GUEST, MockBroker, WAIT_MS, full_presence, sample_rounds};

#[tokio::test]
async fn test_teardown_mid_connect() {
    init_tracing();

    let broker = MockBroker::new();
    let gate = Arc::new(Notify::new());
    broker.script([ConnectBehavior::Gate(gate.clone())]);

    let room = create_test_room(&broker, GUEST, full_presence());
    assert!(broker.wait_for_attempts(1, WAIT_MS).await);

    room.teardown().await;
    // Letting the stalled attempt finish must not revive the room.
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(broker.live_links(), 0);
    assert_eq!(broker.attempts(), 1);
    let game = ServerEvent::GameStarted {
        rounds: sample_rounds(1),
    };
    assert_eq!(broker.inject(game.encode()).await, 0);

    assert_eq!(room.snapshot().round_count, 0);
    assert_eq!(
        room.execute(RoomCommand::StartMeeting).await,
        Err(RoomError::Closed)
    );

    // Second teardown is a no-op.
    room.teardown().await;
}
