pub mod form;
pub mod headers;
