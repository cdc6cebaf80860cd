pub mod job_description;
pub mod question;
pub mod response;
