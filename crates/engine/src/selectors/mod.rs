// Read-only query helpers, one module per entity family
//
// Selectors encapsulate the visibility rules (pending-deleted channels,
// deactivated users) and never raise for absence: a missing row is an
// absent value, and the services attach business meaning to it.

pub mod channels;
pub mod items;
pub mod posts;
pub mod stocks;
pub mod user_channels;
pub mod users;
pub mod verification_codes;
