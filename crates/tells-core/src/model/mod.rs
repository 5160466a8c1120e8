pub mod board;
pub mod seat;
pub mod stone;
