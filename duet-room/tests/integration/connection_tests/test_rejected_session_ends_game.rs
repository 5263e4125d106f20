use duet_core::Phase;
use duet_room::{ConnectionStatus, RoomConfig, RoomHandle};
use std::time::Duration;

use crate::integration::{TEST_ROOM, init_tracing};
use crate::utils::{
    ConnectBehavior, HOST, MockBroker, WAIT_MS, fast_transport, full_presence, wait_for_snapshot,
};

#[tokio::test]
async fn test_rejected_session_ends_game() {
    init_tracing();

    let broker = MockBroker::new();
    broker.script([ConnectBehavior::Reject("invalid token".to_owned())]);

    let config = RoomConfig::new(TEST_ROOM, HOST).with_entry_phase(Phase::Wait);
    let room = RoomHandle::open(config, fast_transport(), broker.connector(), full_presence())
        .expect("valid room config");
    let mut snapshots = room.subscribe();

    let snapshot = wait_for_snapshot(&mut snapshots, WAIT_MS, |s| {
        matches!(s.connection, ConnectionStatus::Failed { .. })
    })
    .await
    .expect("Rejection is reported");
    assert_eq!(snapshot.phase, Phase::End);
    match snapshot.connection {
        ConnectionStatus::Failed { reason } => assert!(reason.contains("invalid token")),
        other => panic!("unexpected status {:?}", other),
    }

    // No retry after a fatal rejection.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(broker.attempts(), 1);

    room.teardown().await;
}
