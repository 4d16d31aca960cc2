//! Internal implementation details.

pub(crate) mod contain;

pub(crate) use contain::{contained, tracked};
