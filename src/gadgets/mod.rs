pub mod bits;
pub mod bounded_array;
pub mod curve;
pub mod element;
pub mod fixed_scalar;
pub mod hashable;
pub mod select;
