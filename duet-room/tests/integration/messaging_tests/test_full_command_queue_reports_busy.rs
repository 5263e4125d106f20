use duet_room::{RoomCommand, RoomError};

use crate::integration::{create_test_room, init_tracing};
use crate::utils::{GUEST, MockBroker, full_presence};

#[tokio::test(flavor = "current_thread")]
async fn test_full_command_queue_reports_busy() {
    init_tracing();

    let broker = MockBroker::new();
    let room = create_test_room(&broker, GUEST, full_presence());

    // The view cannot drain the queue until this task yields.
    let mut accepted = 0;
    let outcome = loop {
        match room.send(RoomCommand::StartMeeting) {
            Ok(()) if accepted < 10_000 => accepted += 1,
            other => break other,
        }
    };
    assert_eq!(outcome, Err(RoomError::Busy));
    assert!(accepted > 0);

    room.teardown().await;
    assert_eq!(room.send(RoomCommand::StartMeeting), Err(RoomError::Closed));
}
