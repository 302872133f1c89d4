pub mod template;
pub mod verify;
