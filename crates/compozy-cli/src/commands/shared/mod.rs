pub mod history;
pub mod parse;
pub mod request;
