//! User identifier, shared with other crates through the kernel
pub use kernel::id::UserId;
