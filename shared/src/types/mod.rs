//! Data model types

pub mod device;
