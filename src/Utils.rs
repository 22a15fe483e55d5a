/// console logging initialization
pub mod logging;
