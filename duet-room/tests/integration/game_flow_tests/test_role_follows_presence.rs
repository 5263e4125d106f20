use duet_core::{Category, ClientEvent, Phase};
use duet_room::{
    ConnectionStatus, Participant, PresenceProvider, Role, RoomCommand, RoomConfig, RoomRequest,
    RoomView, Slot, StateError, TransportEvent,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::integration::{TEST_ROOM, init_tracing};
use crate::utils::{GUEST, HOST, RecordingSink, WAIT_MS, full_presence, wait_for_snapshot};

#[tokio::test]
async fn test_role_follows_presence() {
    init_tracing();

    let sink = RecordingSink::new();
    let presence = full_presence();
    let (transport_tx, transport_rx) = mpsc::channel(16);
    let (view, command_tx, mut snapshots) = RoomView::new(
        RoomConfig::new(TEST_ROOM, GUEST),
        Arc::new(sink.clone()),
        transport_rx,
        presence.subscribe(),
    );
    let task = tokio::spawn(view.run());

    wait_for_snapshot(&mut snapshots, WAIT_MS, |s| {
        s.layout.female.iter().all(|slot| !slot.is_vacant())
    })
    .await
    .expect("Layout built from presence");

    let (reply_tx, reply_rx) = oneshot::channel();
    command_tx
        .send(RoomRequest {
            command: RoomCommand::StartGame,
            reply: Some(reply_tx),
        })
        .await
        .unwrap();
    assert_eq!(
        reply_rx.await.unwrap(),
        Err(StateError::NotHost("start the game"))
    );
    assert!(sink.events().is_empty());

    // Host leaves; the guest is promoted by the presence layer.
    presence.leave(HOST);
    presence.join(Participant::new(GUEST, "guest", Category::Female).host());
    let snapshot = wait_for_snapshot(&mut snapshots, WAIT_MS, |s| s.role == Role::Host)
        .await
        .expect("Role recomputed from presence");
    assert_eq!(snapshot.layout.male.len(), 2);
    assert!(matches!(snapshot.layout.male[0], Slot::Occupied { .. }));
    assert_eq!(snapshot.layout.male[1], Slot::Vacant);
    assert_eq!(snapshot.phase, Phase::End, "Presence changes never move the phase");

    command_tx.send(RoomCommand::StartGame.into()).await.unwrap();
    wait_for_snapshot(&mut snapshots, WAIT_MS, |s| s.phase == Phase::Loading)
        .await
        .expect("New host may start the game");
    assert_eq!(sink.take(), vec![ClientEvent::GameStart]);

    transport_tx
        .send(TransportEvent::Status(ConnectionStatus::Failed {
            reason: "revoked".to_owned(),
        }))
        .await
        .unwrap();
    wait_for_snapshot(&mut snapshots, WAIT_MS, |s| s.phase == Phase::End)
        .await
        .expect("Fatal transport error ends the game");

    drop(command_tx);
    task.await.expect("Room view exits cleanly");
}
