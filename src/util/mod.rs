
/// Generic functionality for reading/writing serializable object to file, and loading variant files
pub mod file_io;
