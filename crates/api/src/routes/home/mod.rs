mod index;

pub use index::{index_handler, AVAILABLE_ROUTES};
