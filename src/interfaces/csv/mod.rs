pub mod rate_reader;
