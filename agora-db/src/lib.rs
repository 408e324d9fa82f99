pub mod cache;
pub mod client;
pub mod composer;
mod record;
pub mod source;
pub mod submit;

#[cfg(test)]
mod testing;
