pub mod keys;
pub mod printer;
pub mod s3;
pub mod selection;
pub mod store;
