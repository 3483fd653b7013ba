pub mod agent_loop;
pub mod backend;
pub mod belief;
pub mod bus;
pub mod cli;
pub mod condition;
pub mod config;
pub mod desire;
pub mod director;
pub mod domain;
pub mod logging;
pub mod plan;
pub mod reactive;
pub mod types;
