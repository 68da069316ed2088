//! Book endpoints: listing with filter/sort/pagination, CRUD, and the
//! author book-count synchronization that rides along with each mutation.

mod handler;
mod routes;

pub use routes::routes;
