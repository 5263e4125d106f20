use duet_core::{ClientEvent, Phase};
use duet_room::{Role, RoomCommand};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{HOST, MockBroker, WAIT_MS, full_presence, sample_rounds, wait_for_snapshot};

#[tokio::test]
async fn test_host_starts_game() {
    init_tracing();

    let broker = MockBroker::echoing(sample_rounds(1));
    let room = create_test_room(&broker, HOST, full_presence());
    let mut snapshots = room.subscribe();

    wait_for_snapshot(&mut snapshots, WAIT_MS, |s| {
        s.is_connected() && s.role == Role::Host
    })
    .await
    .expect("Host should connect");

    room.execute(RoomCommand::StartGame)
        .await
        .expect("Host may start the game");

    let snapshot = wait_for_snapshot(&mut snapshots, WAIT_MS, |s| s.round_count == 1)
        .await
        .expect("Rounds should arrive with the echo");
    assert_eq!(snapshot.phase, Phase::Loading);
    assert_eq!(snapshot.round_index, 0);
    assert_eq!(broker.published(), vec![ClientEvent::GameStart]);

    // Capacity 4 splits into two columns of two.
    assert_eq!(snapshot.layout.male.len(), 2);
    assert_eq!(snapshot.layout.female.len(), 2);

    room.teardown().await;
}
