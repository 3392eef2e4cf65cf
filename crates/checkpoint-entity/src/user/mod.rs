//! User-facing identity resolved from the external directory.

pub mod profile;

pub use profile::UserProfile;
