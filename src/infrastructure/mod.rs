pub mod backend_records;
pub mod memory;
pub mod shutdown;
