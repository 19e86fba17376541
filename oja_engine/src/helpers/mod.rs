//! Small helper functions that don't fit anywhere else.
mod references;

pub use references::{new_order_number, new_payment_reference};
