pub mod packet;
pub mod ring;
pub mod router;
pub mod sync;
