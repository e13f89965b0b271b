pub mod fixtures;

use std::sync::Arc;
use strata_storage::{InMemoryObjectClient, ObjectStorage};

/// Test storage over an isolated in-memory object client
pub struct TestStorage {
    pub storage: ObjectStorage,
    pub client: Arc<InMemoryObjectClient>,
    pub tenant: String,
}

impl TestStorage {
    pub fn tenant(&self) -> Option<&str> {
        Some(self.tenant.as_str())
    }
}

/// Setup storage with a fresh tenant
pub fn setup_test_storage() -> TestStorage {
    // A second init in the same binary fails; the first one wins.
    let _ = strata_infra::init_telemetry(None);

    let client = Arc::new(InMemoryObjectClient::new());
    let storage = ObjectStorage::new(client.clone());

    TestStorage {
        storage,
        client,
        tenant: fixtures::tenant_id(),
    }
}
