pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Short 8-hex id used to suffix channel topics so re-activations never
/// collide with a stale topic from a prior teardown.
pub fn short_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    format!(
        "{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}
