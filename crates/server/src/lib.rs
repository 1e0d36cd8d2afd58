//! HTTP surface for the portfolio chat: session store, JSON chat routes,
//! health report and the reqwest-backed remote answer and lead delivery
//! integrations.

pub mod bootstrap;
pub mod chat;
pub mod health;
pub mod notify;
pub mod remote;
