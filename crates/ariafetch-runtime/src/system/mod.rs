//! Host system probing.

mod interfaces;

pub use interfaces::{SysinfoInterfaceProbe, select_bindable};
