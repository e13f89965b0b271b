use bytes::Bytes;
use uuid::Uuid;

/// A random tenant id
pub fn tenant_id() -> String {
    format!("tenant-{}", Uuid::new_v4().simple())
}

/// A random top-level prefix such as `/3f2a.../storage`
pub fn prefix() -> String {
    format!("/{}/storage", Uuid::new_v4().simple())
}

/// Content stored by most tests
pub fn content() -> Bytes {
    Bytes::from_static(
        b"id: storage\nnamespace: io.strata.tests\ntasks:\n  - id: log\n    message: hello\n",
    )
}
