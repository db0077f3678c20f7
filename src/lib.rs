mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod memory;
    pub mod schema;
}
mod discovery {
    pub mod filter;
    pub mod ranker;
    pub mod resolver;
    pub mod scorer;
    pub mod search;
    pub mod suggest;
    pub mod token;
}
mod session {
    pub mod controller;
    pub mod guided;
    pub mod queue;
    pub mod task;
}
mod authentication {
    pub mod jwt;
    pub mod middleware;
}
mod config;
mod constants;
mod routes;

mod cache {
    pub mod cache;
}

pub use authentication::*;
pub use cache::cache::*;
pub use config::*;
pub use constants::*;
pub use database::*;
pub use discovery::*;
pub use routes::*;
pub use session::*;
