use duet_core::ClientEvent;

/// Outbound half of the room channel.
///
/// Publishing is fire-and-forget: implementations must not block and report no
/// delivery result. Any effect comes back later as an inbound event.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: ClientEvent);
}
