//! LLM provider calls, fan-out dispatch and council judgement

mod council;
mod dispatch;
mod provider;
mod result;

#[cfg(test)]
pub(crate) mod testing;

pub use council::*;
pub use result::*;
