pub mod fixtures;
pub mod mocks;
pub mod mongo;

#[allow(unused_imports)]
pub use fixtures::{coordinates, definition_with_files, keys, scored_definition};
#[allow(unused_imports)]
pub use mocks::{FlakyCollection, InstrumentedStore, RendezvousStore};
#[allow(unused_imports)]
pub use mongo::{MONGO_CONTAINER_START_ERR_PREFIX, MongoTestServer};
