pub mod binder;
pub mod spread;
