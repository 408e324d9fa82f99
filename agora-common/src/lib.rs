pub mod compose;
pub mod model;
pub mod notification;
pub mod validation;
