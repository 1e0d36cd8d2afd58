pub mod lead;
pub mod session;
