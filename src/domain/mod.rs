pub mod clients;
pub mod features;
pub mod palette;
pub mod project;
pub mod project_type;
