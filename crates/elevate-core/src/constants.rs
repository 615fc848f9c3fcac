/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const APP_ROUTE_COMPONENT: &str = "app";
pub const APP_ROUTE_PREFIX: &str = const_str::concat!(API_ROUTE_PREFIX, "/", APP_ROUTE_COMPONENT);

/// Header carrying the actor token when `Authorization` is taken by a gateway key.
pub const USER_TOKEN_HEADER: &str = "x-user-token";

/// Header carrying an explicit organization scope for creator requests.
pub const ORGANIZATION_HEADER: &str = "x-organization-id";
