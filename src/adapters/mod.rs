// Adapters layer: concrete implementations of the collaborator ports.

pub mod local;

pub use local::LocalStore;
