mod couple;
mod financial;
mod merge;
mod money;
mod period;
mod recognition;
mod record;
mod user;

pub use couple::*;
pub use financial::*;
pub use merge::*;
pub use money::*;
pub use period::*;
pub use recognition::*;
pub use record::*;
pub use user::*;
