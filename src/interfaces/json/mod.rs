pub mod catalog;
pub mod request_reader;
pub mod result_writer;
