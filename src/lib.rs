//! strawberry-detect library exports

pub mod api;
pub mod core;

#[cfg(test)]
pub mod test_support;
