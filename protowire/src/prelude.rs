pub use alloc::collections::BTreeMap;
pub use alloc::string::String;
pub use alloc::vec;
pub use alloc::vec::Vec;
