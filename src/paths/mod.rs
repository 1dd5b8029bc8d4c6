pub mod manifest;
pub mod shared;
pub mod staging;
