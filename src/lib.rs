pub mod config;
pub mod dag;
pub mod error;
pub mod history;
pub mod process;

#[cfg(test)]
mod test_support;
