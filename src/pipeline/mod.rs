pub mod builder;
pub mod defaults;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod traits;
