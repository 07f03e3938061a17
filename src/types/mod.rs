pub mod loan;
pub mod margin;
pub mod market;
pub mod position;
pub mod scenario;
pub mod summary;

pub use loan::*;
pub use margin::*;
pub use market::*;
pub use position::*;
pub use scenario::*;
pub use summary::*;
