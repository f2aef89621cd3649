pub mod adapters {
    pub mod cli;
    pub mod render;
    pub mod repl;
}

pub mod app {
    pub mod backend;
    pub mod detail_view;
    pub mod notify;
}

pub mod domain {
    pub mod detail;
    pub mod schema;
}

pub mod infra {
    pub mod config;
    pub mod http;
    pub mod metrics;
}

pub mod shared {
    pub mod error;
    pub mod types;
    pub mod utils;
}
