pub mod gesture;
pub mod viewport_controller;

pub use gesture::{GestureState, PointerTrack};
pub use viewport_controller::ViewportController;
