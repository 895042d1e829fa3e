pub mod app;

pub mod config;

pub mod effects;

pub mod game;

pub mod phase;

pub mod reveal;

pub mod session;

pub mod snapshot;

pub mod storage;

pub mod ui;

pub mod test_helpers;
