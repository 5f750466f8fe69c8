mod driver;
mod navigator;
mod node;
mod path;
mod request;

pub use driver::*;
pub use navigator::*;
pub use node::*;
pub use path::*;
pub use request::*;
