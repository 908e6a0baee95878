//! One handler per command.
//!
//! Handlers run to completion on the server task; the socket serves nothing
//! else while a LOAD or GENERATE is in progress.

pub mod generate;
pub mod load;
pub mod tokenize;

pub use generate::handle_generate;
pub use load::handle_load;
pub use tokenize::handle_tokenize;
