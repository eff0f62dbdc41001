pub mod record;
pub mod classification;
pub mod issue;

pub use record::*;
pub use classification::*;
pub use issue::*;
