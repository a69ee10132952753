pub mod breadcrumb;
pub mod dialog;
pub mod status_bar;
pub mod tree;
