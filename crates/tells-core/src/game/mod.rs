pub mod action;
pub mod challenge;
pub mod event;
pub mod match_state;
pub mod serialization;
