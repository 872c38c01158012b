mod interface;
mod lock;
mod mutex;
mod policy;
mod status;

pub use interface::*;
pub use lock::*;
pub(crate) use mutex::*;
pub use policy::*;
pub use status::*;
