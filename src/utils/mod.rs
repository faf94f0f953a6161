pub mod http;
pub mod logging;
pub mod telegram;
pub mod timing;
