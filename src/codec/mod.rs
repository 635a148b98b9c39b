pub mod sha;
pub mod varint;
pub mod zlib;
