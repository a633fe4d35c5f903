mod alert;
mod category;

pub use alert::{Alert, AlertPayload, IncomingAlert};
pub use category::Category;
