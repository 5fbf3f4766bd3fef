pub mod check;
pub mod list;
pub mod view;
