pub mod mentorship;
pub mod training;
pub mod user;
