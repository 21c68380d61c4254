pub mod ids;
pub mod target;
pub mod usage;
pub mod voucher;
