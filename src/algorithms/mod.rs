pub mod flocking;
pub mod seek;
