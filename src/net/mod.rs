pub mod compression;
pub mod network_nbt;
pub mod packet;
pub mod promise;
