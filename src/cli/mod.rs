pub mod chart;
pub mod compare;
pub mod overview;
pub mod search;
pub mod setup;
pub mod ui;
