//! Board-level drivers built on `embedded-hal` traits.

pub mod enable;
