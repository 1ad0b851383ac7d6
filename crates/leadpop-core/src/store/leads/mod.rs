//! Lead reads (aggregate counts) and writes (batch insert).

mod read;
mod write;
