/// Implemented by every client- and server-originated event struct, and by
/// the tagged enums that enclose them, so the Transport can log and route by
/// wire event name without a downstream match on the concrete type.
pub trait EventType {
    fn event_type(&self) -> &'static str;
}
