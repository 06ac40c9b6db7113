pub mod inference;
pub mod statistics;
pub mod survival;
pub mod train;
