pub mod assessment;
pub mod image;
pub mod verification;
