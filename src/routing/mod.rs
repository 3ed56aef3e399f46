//! Request routing
//!
//! # Components
//!
//! - [`RouteResolver`] - ordered state machine from path to [`RouteOutcome`]
//! - [`RuleSet`] - gone rules and literal/computed redirect rules
//! - [`RequestContext`] - request path and query, passed explicitly
//! - [`RouteError`] - 404/410/301 terminal outcomes

pub mod canonical;
pub mod error;
pub mod request;
pub mod resolver;
pub mod rules;

pub use canonical::{canonical_redirect, normalize_for_compare};
pub use error::RouteError;
pub use request::RequestContext;
pub use resolver::{absolute_destination, RouteOutcome, RouteResolver};
pub use rules::{builtin_redirects, GoneRule, RedirectFn, RedirectRule, RuleSet};
