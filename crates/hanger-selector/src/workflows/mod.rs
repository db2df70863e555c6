pub mod catalog;
pub mod configuration;
pub mod fasteners;
pub mod job_list;
mod normalizer;
pub mod session;
