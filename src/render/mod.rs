#[cfg(feature = "cpu")]
pub mod cpu;
pub mod surface;
