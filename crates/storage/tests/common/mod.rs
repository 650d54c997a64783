pub mod fixtures;
pub mod mocks;

#[allow(unused_imports)]
pub use fixtures::{filesystem_backend, seeded_bytes};
#[allow(unused_imports)]
pub use mocks::InstrumentedBackend;
