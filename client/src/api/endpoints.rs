//! Identity backend paths, relative to the API base URL.

pub const LOGIN: &str = "identity/login";
pub const REFRESH_TOKEN: &str = "identity/refresh";

pub const GET_CLAIMS: &str = "users/claims";
pub const LOGOUT: &str = "users/logout";
