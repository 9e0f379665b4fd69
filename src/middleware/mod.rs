mod staff_auth;

pub use staff_auth::*;
