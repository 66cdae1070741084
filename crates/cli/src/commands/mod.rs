pub mod backends;
pub mod disas;
pub mod generate;
pub mod util;

pub use backends::*;
pub use disas::*;
pub use generate::*;
pub use util::*;
