//! Client-side pieces: the session driver plus the flag handling it
//! consumes.

pub mod env;
pub mod handler;
pub mod info;
pub mod mount;
pub mod state;
