//! Database seeding
//!
//! Reference data the service expects to exist, such as the voice catalogue.

pub mod voice_options;

pub use voice_options::seed_voice_options;
