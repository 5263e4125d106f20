use duet_core::{ClientEvent, Phase};
use duet_room::{Role, RoomCommand};
use std::time::Duration;

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{
    GUEST, HOST, MockBroker, WAIT_MS, full_presence, sample_rounds, wait_for_snapshot,
};

#[tokio::test]
async fn test_start_play_reaches_all_members() {
    init_tracing();

    let broker = MockBroker::echoing(sample_rounds(2));
    let presence = full_presence();
    let host = create_test_room(&broker, HOST, presence.clone());
    let guest = create_test_room(&broker, GUEST, presence);
    assert!(broker.wait_for_links(2, WAIT_MS).await, "Both rooms should connect");

    let mut host_rx = host.subscribe();
    let mut guest_rx = guest.subscribe();
    wait_for_snapshot(&mut host_rx, WAIT_MS, |s| s.role == Role::Host)
        .await
        .expect("Host role from presence");

    host.execute(RoomCommand::StartGame).await.expect("start game");
    for rx in [&mut host_rx, &mut guest_rx] {
        wait_for_snapshot(rx, WAIT_MS, |s| s.phase == Phase::Loading && s.round_count == 2)
            .await
            .expect("Every member caches the rounds");
    }

    host.execute(RoomCommand::Ready).await.expect("host ready");
    host.execute(RoomCommand::StartPlay).await.expect("start play");

    let host_view = wait_for_snapshot(&mut host_rx, WAIT_MS, |s| s.phase == Phase::Play)
        .await
        .expect("Host enters play");
    assert_eq!(host_view.round_index, 1);

    let guest_view = wait_for_snapshot(&mut guest_rx, WAIT_MS, |s| s.phase == Phase::Play)
        .await
        .expect("Guest follows the broadcast");
    assert_eq!(guest_view.round_index, 1);
    assert_eq!(guest_view.role, Role::Participant);
    assert_eq!(
        guest_view.current_round.map(|r| r.content),
        Some("question 1".to_owned())
    );

    // The host's own echo must not advance it twice.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(host.snapshot().round_index, 1);

    let starts = broker
        .published()
        .into_iter()
        .filter(|e| *e == ClientEvent::ChoiceStart)
        .count();
    assert_eq!(starts, 1, "Exactly one round start should be published");

    host.teardown().await;
    guest.teardown().await;
}
