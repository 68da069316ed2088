//! Author CRUD endpoints. `bookCount` is derived and surfaces read-only
//! here; only book mutations and the reconciler ever touch it.

mod handler;
mod routes;

pub use routes::routes;
