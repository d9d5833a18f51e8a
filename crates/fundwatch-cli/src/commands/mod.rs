//! Command implementations.

pub mod backlog;
pub mod entity;
pub mod graph;
pub mod ingest;
pub mod tasks;

pub use self::backlog::execute_backlog;
pub use self::entity::execute_entity;
pub use self::graph::execute_graph;
pub use self::ingest::execute_ingest;
pub use self::tasks::execute_tasks;
