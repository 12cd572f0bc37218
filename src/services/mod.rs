pub mod excel;
pub mod file_processor;
pub mod profile;
pub mod report;
