pub mod dns;
pub mod domain;
pub mod patterns;
pub mod search;
pub mod smtp;
