pub mod error;
pub mod numeric;
pub mod session;
pub mod traits;
pub mod types;

pub use error::*;
pub use numeric::*;
pub use session::*;
pub use traits::*;
pub use types::*;
