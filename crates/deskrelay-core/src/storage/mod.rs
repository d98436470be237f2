// Session storage layer
// Decision: Support both PostgreSQL (multi-instance) and in-memory (dev mode, tests)
//
// - InMemorySessionStore: parking_lot guarded HashMap, lost on restart
// - PgSessionStore: sessions table with JSONB payload, row locks for updates

pub mod backend;
pub mod memory;
pub mod postgres;

pub use backend::SessionBackend;
pub use memory::InMemorySessionStore;
pub use postgres::PgSessionStore;
