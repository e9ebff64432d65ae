pub mod animate;
pub mod compare;
pub mod convert;
pub mod modes;
pub mod view;
