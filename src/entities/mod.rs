pub mod asset;
pub mod department;
pub mod employee;
pub mod location;
pub mod major_category;
pub mod minor_category;
pub mod supplier;
