pub mod audience;
pub mod images;
pub mod trigger;
