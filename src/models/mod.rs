pub mod descriptor;
pub mod platform;
