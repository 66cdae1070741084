#[cfg(feature = "capstone-backend")]
pub mod capstone;
#[cfg(feature = "radare2-backend")]
pub mod radare2;

#[cfg(feature = "capstone-backend")]
pub use capstone::CapstoneBackend;
#[cfg(feature = "radare2-backend")]
pub use radare2::Radare2Backend;
