pub mod dma2;
pub mod error_handlers;
pub mod otg_fs;

pub mod protocol_task;
