// Library root: the terminal front end, exposed so integration tests can
// drive the loop with in-memory readers and writers.

pub mod app;
pub mod render;
