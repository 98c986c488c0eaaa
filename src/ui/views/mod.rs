//! Dashboard views, one per tab plus the login gate.

pub mod attack_vector;
pub mod command_center;
pub mod customers;
pub mod evidence;
pub mod login;
pub mod mailbox;
pub mod reports;
pub mod settings;
pub mod war_room;
