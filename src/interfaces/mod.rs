pub mod console;
pub mod draft_file;
