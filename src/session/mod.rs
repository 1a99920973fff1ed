pub mod legend;
pub mod widget;
