pub mod core;
pub mod interfaces;
pub mod logger;
pub mod post;
pub mod pre;
