pub mod backup;
pub mod classes;
pub mod core;
pub mod document;
pub mod grades;
pub mod logs;
pub mod templates;
