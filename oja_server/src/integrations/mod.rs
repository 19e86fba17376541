pub mod hooks;
pub mod relay;
