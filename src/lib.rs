//! Client for the meeting transcript analysis API: a typed gateway, the
//! history list orchestration, the create-then-analyze flow and exports.

pub mod analysis;
pub mod config;
pub mod export;
pub mod gateway;
pub mod orchestrator;
pub mod output;
pub mod view;
