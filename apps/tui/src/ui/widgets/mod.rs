pub mod charts;
pub mod network;
pub mod palette;
pub mod popup;
pub mod tables;
