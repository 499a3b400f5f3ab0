pub mod detail;
pub mod inventory;
pub mod login;
pub mod overlay;
