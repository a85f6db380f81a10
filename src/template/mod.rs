mod actions;
mod funcs;
mod template;

#[cfg(test)]
mod template_test;

pub use funcs::*;
pub use template::*;
