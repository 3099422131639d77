pub mod auth;
pub mod clipboard;
pub mod logging;
pub mod scroll;
#[cfg(test)]
pub mod test_utils;
pub mod url;
