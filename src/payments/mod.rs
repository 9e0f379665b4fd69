mod paystack;
mod reference;
mod signature;

pub use paystack::*;
pub use reference::*;
pub use signature::*;
