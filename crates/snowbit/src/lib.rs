#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod generator;
mod layout;
#[cfg(feature = "async-tokio")]
mod runtime;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::layout::*;
#[cfg_attr(docsrs, doc(cfg(feature = "async-tokio")))]
#[cfg(feature = "async-tokio")]
pub use crate::runtime::*;
pub use crate::time::*;
