// Mentorship board: explorers post requests for a career field, guides see
// the open requests their expertise covers, and the first guide to accept
// one gets a chat session with the requester, where the two exchange messages.

pub mod chat;
pub mod expertise;
pub mod handlers;
pub mod lifecycle;
pub mod request;
pub mod store;
